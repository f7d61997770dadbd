//! Segment groups: named collections of segments sharing one paragraph
//! base.

use crate::segment::SegmentId;

pub type GroupId = usize;

#[derive(Clone, Debug)]
pub struct Group {
    pub name: String,
    /// The segment into which all members fold; set by consolidation.
    pub main_segno: Option<SegmentId>,
}

/// Append-only group list. A `GroupId` is stable for the life of the
/// program.
#[derive(Clone, Debug, Default)]
pub struct GroupList {
    groups: Vec<Group>,
    case_sensitive: bool,
}

impl GroupList {
    pub fn new(case_sensitive: bool) -> Self {
        GroupList {
            groups: Vec::new(),
            case_sensitive,
        }
    }

    pub fn count(&self) -> usize {
        self.groups.len()
    }

    pub fn add(&mut self, name: &str) -> GroupId {
        self.groups.push(Group {
            name: name.to_string(),
            main_segno: None,
        });
        self.groups.len() - 1
    }

    pub fn get(&self, groupno: GroupId) -> &Group {
        &self.groups[groupno]
    }

    pub fn name(&self, groupno: GroupId) -> &str {
        &self.groups[groupno].name
    }

    pub fn main_segno(&self, groupno: GroupId) -> Option<SegmentId> {
        self.groups[groupno].main_segno
    }

    pub fn set_main_segno(&mut self, groupno: GroupId, segno: SegmentId) {
        self.groups[groupno].main_segno = Some(segno);
    }

    pub fn find(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| {
            if self.case_sensitive {
                g.name == name
            } else {
                g.name.eq_ignore_ascii_case(name)
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_found_by_name() {
        let mut groups = GroupList::new(false);
        let dgroup = groups.add("DGROUP");
        groups.add("CGROUP");
        assert_eq!(groups.find("dgroup"), Some(dgroup));
        assert_eq!(groups.find("EGROUP"), None);
        assert_eq!(groups.count(), 2);
    }

    #[test]
    fn main_segno_is_recorded() {
        let mut groups = GroupList::new(true);
        let g = groups.add("DGROUP");
        assert_eq!(groups.main_segno(g), None);
        groups.set_main_segno(g, 3);
        assert_eq!(groups.main_segno(g), Some(3));
        assert_eq!(groups.find("dgroup"), None);
    }
}

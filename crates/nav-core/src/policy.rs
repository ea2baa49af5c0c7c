//! Navigation decision table.

use crate::zone::FrameOccupancy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    MoveLeft,
    MoveRight,
    AnnounceBlocked,
    None,
}

impl Directive {
    /// Text to speak, if any
    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            Directive::MoveLeft => Some("move left"),
            Directive::MoveRight => Some("move right"),
            Directive::AnnounceBlocked => Some("Obstacle ahead, can't move"),
            Directive::None => None,
        }
    }
}

/// Pick a directive from zone occupancy. Rows are checked top to bottom:
///
/// | center | left | right | directive |
/// |---|---|---|---|
/// | yes | no | any | MoveLeft |
/// | yes | yes | no | MoveRight |
/// | yes | yes | yes | AnnounceBlocked |
/// | no | yes | any | MoveRight |
/// | no | no | yes | MoveLeft |
/// | no | no | no | None |
pub fn decide(occupancy: &FrameOccupancy) -> Directive {
    match (occupancy.center, occupancy.left, occupancy.right) {
        (true, false, _) => Directive::MoveLeft,
        (true, true, false) => Directive::MoveRight,
        (true, true, true) => Directive::AnnounceBlocked,
        (false, true, _) => Directive::MoveRight,
        (false, false, true) => Directive::MoveLeft,
        (false, false, false) => Directive::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(center: bool, left: bool, right: bool) -> FrameOccupancy {
        FrameOccupancy {
            left,
            center,
            right,
            labels: Vec::new(),
        }
    }

    #[test]
    fn test_full_truth_table() {
        let table = [
            ((false, false, false), Directive::None),
            ((false, false, true), Directive::MoveLeft),
            ((false, true, false), Directive::MoveRight),
            ((false, true, true), Directive::MoveRight),
            ((true, false, false), Directive::MoveLeft),
            ((true, false, true), Directive::MoveLeft),
            ((true, true, false), Directive::MoveRight),
            ((true, true, true), Directive::AnnounceBlocked),
        ];
        for ((center, left, right), expected) in table {
            assert_eq!(
                decide(&occ(center, left, right)),
                expected,
                "center={center} left={left} right={right}"
            );
        }
    }

    #[test]
    fn test_phrases() {
        assert_eq!(Directive::MoveLeft.phrase(), Some("move left"));
        assert_eq!(Directive::MoveRight.phrase(), Some("move right"));
        assert_eq!(
            Directive::AnnounceBlocked.phrase(),
            Some("Obstacle ahead, can't move")
        );
        assert_eq!(Directive::None.phrase(), None);
    }
}

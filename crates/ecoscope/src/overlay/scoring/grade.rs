use std::fmt;

use serde::{Serialize, Serializer};

/// Letter grade for a composite total. Variants are declared worst-first so
/// the derived ordering follows the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    F,
    D,
    C,
    CPlus,
    B,
    BPlus,
    A,
    APlus,
}

impl Grade {
    pub fn from_total(total: u8) -> Self {
        match total {
            90.. => Self::APlus,
            80..=89 => Self::A,
            70..=79 => Self::BPlus,
            60..=69 => Self::B,
            50..=59 => Self::CPlus,
            40..=49 => Self::C,
            30..=39 => Self::D,
            _ => Self::F,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::APlus | Self::A => "#4CAF50",
            Self::BPlus | Self::B => "#8BC34A",
            Self::CPlus | Self::C => "#FFC107",
            Self::D => "#FF9800",
            Self::F => "#F44336",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_map_to_expected_letters() {
        let cases = [
            (100, "A+"),
            (90, "A+"),
            (89, "A"),
            (80, "A"),
            (70, "B+"),
            (60, "B"),
            (59, "C+"),
            (46, "C"),
            (30, "D"),
            (29, "F"),
            (0, "F"),
        ];
        for (total, label) in cases {
            assert_eq!(Grade::from_total(total).label(), label, "total {total}");
        }
    }

    #[test]
    fn grade_never_drops_as_total_rises() {
        let grades: Vec<Grade> = (0..=100).map(Grade::from_total).collect();
        assert!(grades.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

//! Reps notation: "10", "8-12", "20+"
//!
//! The reps editor works on a 1..=21 scale where 21 reads as "20+".

pub const MIN_REPS: u32 = 1;
pub const MAX_REPS: u32 = 21;
const FALLBACK_REPS: u32 = 10;

/// Reps target as two thumbs on a slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reps {
    pub min: u32,
    pub max: u32,
}

/// Which slider thumb to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumb {
    Min,
    Max,
}

fn clamp(v: u32) -> u32 {
    v.clamp(MIN_REPS, MAX_REPS)
}

fn format_value(v: u32) -> String {
    if v >= MAX_REPS {
        "20+".to_string()
    } else {
        v.to_string()
    }
}

/// Leading-digits integer, like `parseInt`
fn leading_int(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl Reps {
    pub fn single(v: u32) -> Self {
        let v = clamp(v);
        Self { min: v, max: v }
    }

    pub fn range(a: u32, b: u32) -> Self {
        let (a, b) = (clamp(a), clamp(b));
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Lenient parse. A missing or zero end of a range falls back to 10,
    /// unparseable text is a single 10. "N+" means N..=21.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some((lo, hi)) = s.split_once('-') {
            let lo = leading_int(lo).filter(|v| *v > 0).unwrap_or(FALLBACK_REPS);
            let hi = leading_int(hi).filter(|v| *v > 0).unwrap_or(FALLBACK_REPS);
            // "20+" as an upper end is the top of the scale
            let hi = if s.ends_with('+') { MAX_REPS } else { hi };
            return Self::range(lo, hi);
        }
        if let Some(base) = s.strip_suffix('+') {
            let lo = leading_int(base).unwrap_or(FALLBACK_REPS);
            if lo >= MAX_REPS - 1 {
                return Self::single(MAX_REPS);
            }
            return Self::range(lo, MAX_REPS);
        }
        Self::single(leading_int(s).unwrap_or(FALLBACK_REPS))
    }

    pub fn is_single(&self) -> bool {
        self.min == self.max
    }

    /// Text stored on the exercise
    pub fn format(&self) -> String {
        if self.is_single() {
            format_value(self.min)
        } else {
            format!("{}-{}", format_value(self.min), format_value(self.max))
        }
    }

    /// Move one thumb by `delta`, clamped to the scale. Thumbs may cross;
    /// min/max are re-sorted afterwards.
    pub fn nudge(&mut self, thumb: Thumb, delta: i32) {
        let apply = |v: u32| clamp((v as i64 + delta as i64).max(0) as u32);
        let (a, b) = match thumb {
            Thumb::Min => (apply(self.min), self.max),
            Thumb::Max => (self.min, apply(self.max)),
        };
        *self = Self::range(a, b);
    }
}

/// "1 rep" / "12 reps" / "8-12 reps"
pub fn reps_label(reps: &str) -> String {
    if reps.trim() == "1" {
        "1 rep".to_string()
    } else {
        format!("{} reps", reps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        assert_eq!(Reps::parse("12"), Reps { min: 12, max: 12 });
        assert_eq!(Reps::parse(" 8 "), Reps { min: 8, max: 8 });
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(Reps::parse("8-12"), Reps { min: 8, max: 12 });
        // Reversed ends are sorted
        assert_eq!(Reps::parse("15-10"), Reps { min: 10, max: 15 });
    }

    #[test]
    fn test_parse_range_missing_end_defaults_to_ten() {
        assert_eq!(Reps::parse("-15"), Reps { min: 10, max: 15 });
        assert_eq!(Reps::parse("5-"), Reps { min: 5, max: 10 });
    }

    #[test]
    fn test_parse_open_ended() {
        assert_eq!(Reps::parse("20+"), Reps { min: 21, max: 21 });
        assert_eq!(Reps::parse("15+"), Reps { min: 15, max: 21 });
        assert_eq!(Reps::parse("12-20+"), Reps { min: 12, max: 21 });
    }

    #[test]
    fn test_parse_garbage_falls_back() {
        assert_eq!(Reps::parse("max"), Reps { min: 10, max: 10 });
        assert_eq!(Reps::parse(""), Reps { min: 10, max: 10 });
    }

    #[test]
    fn test_parse_clamps_to_scale() {
        assert_eq!(Reps::parse("50"), Reps { min: 21, max: 21 });
        assert_eq!(Reps::parse("0"), Reps { min: 1, max: 1 });
    }

    #[test]
    fn test_format() {
        assert_eq!(Reps::single(10).format(), "10");
        assert_eq!(Reps::range(8, 12).format(), "8-12");
        assert_eq!(Reps::single(21).format(), "20+");
        assert_eq!(Reps::range(15, 21).format(), "15-20+");
    }

    #[test]
    fn test_format_parse_is_stable() {
        for text in ["1", "10", "8-12", "20+", "15-20+"] {
            assert_eq!(Reps::parse(text).format(), text);
        }
    }

    #[test]
    fn test_nudge() {
        let mut reps = Reps::single(10);
        reps.nudge(Thumb::Max, 2);
        assert_eq!(reps.format(), "10-12");
        reps.nudge(Thumb::Min, -20);
        assert_eq!(reps, Reps { min: 1, max: 12 });
        reps.nudge(Thumb::Max, 100);
        assert_eq!(reps.format(), "1-20+");
    }

    #[test]
    fn test_nudge_thumbs_cross() {
        let mut reps = Reps::range(8, 10);
        reps.nudge(Thumb::Min, 5);
        assert_eq!(reps, Reps { min: 10, max: 13 });
    }

    #[test]
    fn test_reps_label() {
        assert_eq!(reps_label("1"), "1 rep");
        assert_eq!(reps_label("10"), "10 reps");
        assert_eq!(reps_label("8-12"), "8-12 reps");
    }
}

use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

/// Honors the formatter precision, so `{:.1}` prints `50.0%`.
impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match f.precision() {
            Some(precision) => write!(f, "{:.*}%", precision, self.0),
            None => write!(f, "{}%", self.0),
        }
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `reference` that `seconds` represents. A zero reference yields 0%.
pub fn seconds_percentage(seconds: u64, reference: u64) -> Percentage {
    if reference == 0 {
        return Percentage(0.);
    }
    Percentage::new_opt(seconds as f64 / reference as f64 * 100.)
        .expect("Percentage of unsigned values should always be at least 0")
}

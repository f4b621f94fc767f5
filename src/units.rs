use crate::time::Delta;

macro_rules! unit {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
            derive_more::Display,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(u64::MAX);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_u64(self) -> u64 {
                self.0
            }

            pub const fn into_f64(self) -> f64 {
                self.0 as f64
            }

            pub const fn into_usize(self) -> usize {
                self.0 as usize
            }

            pub const fn saturating_sub(self, rhs: Self) -> Self {
                Self::new(self.0.saturating_sub(rhs.0))
            }
        }
    };
}

unit!(Bytes);
unit!(Secs);

impl Secs {
    pub fn into_ms(self) -> Delta {
        Delta::new(self.0 as f64 * 1_000.0)
    }
}

// Real-valued quantities. These do not get `Ord`; callers validate them once at configuration
// time and only use them as multipliers afterwards.
macro_rules! real_unit {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialEq,
            PartialOrd,
            derive_more::Display,
            derive_more::FromStr,
            derive_more::From,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(f64);

        impl $name {
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            pub const fn into_f64(self) -> f64 {
                self.0
            }

            /// Finite and strictly positive.
            pub fn is_valid(self) -> bool {
                self.0.is_finite() && self.0 > 0.0
            }
        }
    };
}

real_unit!(PacketsPerSec);
real_unit!(Weight);

impl PacketsPerSec {
    /// The fixed spacing between transmissions at this rate, in milliseconds.
    pub fn interval(&self) -> Delta {
        assert!(self.is_valid(), "output rate must be positive");
        Delta::new(1_000.0 / self.0)
    }
}

impl Weight {
    pub const ONE: Weight = Weight::new(1.0);
}

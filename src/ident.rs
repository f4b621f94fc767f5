macro_rules! identifier {
    ($name: ident, $inner: ty) => {
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
            derive_more::Display,
            derive_more::FromStr,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(<$inner>::MAX);

            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            pub const fn inner(self) -> $inner {
                self.0
            }
        }
    };
}

identifier!(FlowId, u64);

// Smaller is more urgent. The range is not restricted.
identifier!(Priority, i64);

// Monotonic insertion counter, used to break exact ties deterministically.
identifier!(Seq, u64);

impl Seq {
    /// Returns the current value and advances the counter.
    pub(crate) fn bump(&mut self) -> Seq {
        let cur = *self;
        self.0 += 1;
        cur
    }
}

impl FlowId {
    pub fn from_usize(val: usize) -> Self {
        Self(val as u64)
    }
}

/// Address of one microcontroller on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct UnitAddress(pub u8);

impl UnitAddress {
    /// Board-originated packets carry no address and decode as this.
    pub const BROADCAST: Self = Self(0);

    #[inline]
    pub const fn new(address: u8) -> Self {
        Self(address)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Credits charged for a booking, or returned when it is cancelled in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cost {
    /// The booking owner; free while unlimited access is active.
    pub own: u32,
    pub guests: u32,
}

impl Cost {
    pub fn new(price: u32, participants: u32, unlimited: bool) -> Cost {
        let own = if unlimited { 0 } else { price };
        let guests = participants.saturating_sub(1).saturating_mul(price);
        Cost { own, guests }
    }

    pub fn total(&self) -> u32 {
        self.own.saturating_add(self.guests)
    }

    pub fn is_free(&self) -> bool {
        self.total() == 0
    }
}

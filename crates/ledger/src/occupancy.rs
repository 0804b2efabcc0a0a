use model::booking::Booking;

/// Headcount reserved for one session, derived from its bookings on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Occupancy(u32);

impl Occupancy {
    pub fn of<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Occupancy {
        Occupancy(
            bookings
                .into_iter()
                .map(Booking::headcount)
                .fold(0, u32::saturating_add),
        )
    }

    pub fn taken(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn free(&self, capacity: u32) -> u32 {
        capacity.saturating_sub(self.0)
    }

    pub fn admits(&self, capacity: u32, participants: u32) -> bool {
        self.0
            .checked_add(participants)
            .map(|total| total <= capacity)
            .unwrap_or(false)
    }
}

//! Seat allocation for a single booking request
//!
//! `allocate` is pure: it reads an immutable occupancy snapshot and threads a
//! local set of seats claimed by this call through its passes. It always
//! returns one assignment per passenger, in request order. A full train
//! produces RAC and waitlist outcomes, never an error.
//!
//! Passes, over coaches in code order:
//!
//! 1. Whole group: the first coach that can seat the entire party wins.
//! 2. Split: greedily seat the head of the priority queue coach by coach,
//!    moving on at the first passenger a coach cannot take.
//! 3. Overflow: whoever is left becomes RAC while the buffer has room, then
//!    waitlisted.

use chrono::NaiveDate;
use rail_core::models::{
    BerthPreference, Coach, Gender, PassengerInput, Seat, SeatAssignment, SeatKey,
};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::constants::{SENIOR_AGE, SENIOR_FEMALE_AGE};

/// Everything the allocator needs, borrowed from the caller's snapshot
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest<'a> {
    pub passengers: &'a [PassengerInput],

    /// Coaches of the class, in code order
    pub coaches: &'a [Coach],

    /// Seats already held by confirmed passengers on the journey date
    pub occupied: &'a HashSet<SeatKey>,

    /// Passenger slots already on live reservations
    pub booked: i64,

    pub rac_capacity: i64,

    /// Seat numbers held back in every coach for priority passengers
    pub reserved_seat_numbers: &'a [i32],

    /// Date the allocation runs on
    pub as_of: NaiveDate,

    pub journey_date: NaiveDate,
}

impl AllocationRequest<'_> {
    /// Same-day allocation relaxes the reserved pool for seniors
    pub fn chart_prepared(&self) -> bool {
        self.as_of == self.journey_date
    }

    pub fn total_capacity(&self) -> i64 {
        self.coaches.iter().map(|c| c.capacity() as i64).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    /// One per passenger, in request order
    pub assignments: Vec<SeatAssignment>,
}

impl AllocationResult {
    pub fn confirmed_seats(&self) -> impl Iterator<Item = SeatKey> + '_ {
        self.assignments.iter().filter_map(SeatAssignment::seat_key)
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed_seats().count()
    }
}

pub fn is_senior(passenger: &PassengerInput) -> bool {
    passenger.age > SENIOR_AGE
        || (passenger.gender == Gender::Female && passenger.age >= SENIOR_FEMALE_AGE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Priority {
    Disabled,
    Senior,
    General,
}

fn priority(passenger: &PassengerInput) -> Priority {
    if passenger.is_disabled {
        Priority::Disabled
    } else if is_senior(passenger) {
        Priority::Senior
    } else {
        Priority::General
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Reserved,
    General,
}

/// Pools a passenger may draw from, in order of preference
fn eligible_pools(passenger: &PassengerInput, chart_prepared: bool) -> &'static [Pool] {
    match priority(passenger) {
        Priority::Disabled => &[Pool::Reserved, Pool::General],
        Priority::Senior if chart_prepared => &[Pool::General, Pool::Reserved],
        Priority::Senior | Priority::General => &[Pool::General],
    }
}

/// Unoccupied seats of one coach, split by pool, each in seat-number order
struct CoachPools<'a> {
    coach: &'a Coach,
    reserved: Vec<&'a Seat>,
    general: Vec<&'a Seat>,
}

impl<'a> CoachPools<'a> {
    fn new(coach: &'a Coach, occupied: &HashSet<SeatKey>, reserved_numbers: &[i32]) -> Self {
        let mut seats: Vec<&Seat> = coach
            .seats
            .iter()
            .filter(|s| !occupied.contains(&SeatKey::new(coach.code.as_str(), s.number)))
            .collect();
        seats.sort_by_key(|s| s.number);

        let (reserved, general) = seats
            .into_iter()
            .partition(|s| reserved_numbers.contains(&s.number));

        Self {
            coach,
            reserved,
            general,
        }
    }

    fn key(&self, seat: &Seat) -> SeatKey {
        SeatKey::new(self.coach.code.as_str(), seat.number)
    }

    fn available(&self, claimed: &HashSet<SeatKey>) -> usize {
        self.reserved
            .iter()
            .chain(self.general.iter())
            .filter(|s| !claimed.contains(&self.key(s)))
            .count()
    }

    /// First free seat in a pool, honouring the berth preference when one matches
    fn pick(
        &self,
        pool: Pool,
        preference: BerthPreference,
        claimed: &HashSet<SeatKey>,
    ) -> Option<&'a Seat> {
        let seats = match pool {
            Pool::Reserved => &self.reserved,
            Pool::General => &self.general,
        };
        let mut free = seats.iter().copied().filter(|s| !claimed.contains(&self.key(s)));

        if preference.is_specific() {
            let candidates: Vec<&Seat> = free.collect();
            return candidates
                .iter()
                .copied()
                .find(|s| preference.matches(s.berth))
                .or_else(|| candidates.first().copied());
        }
        free.next()
    }

    /// Apply the per-passenger pool rule against this coach
    fn seat_for(
        &self,
        passenger: &PassengerInput,
        chart_prepared: bool,
        claimed: &HashSet<SeatKey>,
    ) -> Option<&'a Seat> {
        eligible_pools(passenger, chart_prepared)
            .iter()
            .find_map(|&pool| self.pick(pool, passenger.berth_preference, claimed))
    }
}

/// Seat every passenger of the request, falling back to RAC and waitlist
pub fn allocate(request: &AllocationRequest<'_>) -> AllocationResult {
    let passengers = request.passengers;
    let chart_prepared = request.chart_prepared();

    let pools: Vec<CoachPools<'_>> = request
        .coaches
        .iter()
        .map(|c| CoachPools::new(c, request.occupied, request.reserved_seat_numbers))
        .collect();

    // Stable: request order is kept within each tier
    let mut order: Vec<usize> = (0..passengers.len()).collect();
    order.sort_by_key(|&i| priority(&passengers[i]));

    let mut assigned: Vec<Option<SeatAssignment>> = vec![None; passengers.len()];
    let mut claimed: HashSet<SeatKey> = HashSet::new();

    let whole_group = pools
        .iter()
        .filter(|p| p.available(&claimed) >= order.len())
        .find_map(|p| seat_group(p, passengers, &order, chart_prepared));

    match whole_group {
        Some((coach, seats)) => {
            debug!("Party of {} seated together in {}", order.len(), coach);
            for (idx, seat) in seats {
                assigned[idx] = Some(SeatAssignment::confirmed(coach, seat.number, seat.berth));
            }
        }
        None => {
            let mut queue: VecDeque<usize> = order.iter().copied().collect();
            for pool in &pools {
                while let Some(&idx) = queue.front() {
                    let Some(seat) = pool.seat_for(&passengers[idx], chart_prepared, &claimed) else {
                        break;
                    };
                    claimed.insert(pool.key(seat));
                    assigned[idx] = Some(SeatAssignment::confirmed(
                        pool.coach.code.as_str(),
                        seat.number,
                        seat.berth,
                    ));
                    queue.pop_front();
                }
                if queue.is_empty() {
                    break;
                }
            }
        }
    }

    let confirmed_now = assigned.iter().filter(|a| a.is_some()).count() as i64;
    let total = request.total_capacity();
    let rac_limit = total + request.rac_capacity;

    // Overflow queues behind confirmed capacity and behind the RAC and
    // waitlisted passengers already on the books, even when the only free
    // seats left are reserved ones
    let queued = (request.booked - request.occupied.len() as i64).max(0);
    let mut slot = (request.booked + confirmed_now).max(total + queued);
    let mut assignments = Vec::with_capacity(assigned.len());
    for outcome in assigned {
        let assignment = match outcome {
            Some(confirmed) => confirmed,
            None => {
                let assignment = if slot < rac_limit {
                    SeatAssignment::rac((slot - total + 1) as i32)
                } else {
                    SeatAssignment::waitlisted((slot - rac_limit + 1) as i32)
                };
                slot += 1;
                assignment
            }
        };
        assignments.push(assignment);
    }

    AllocationResult { assignments }
}

/// Try to seat the whole party in one coach
fn seat_group<'a>(
    pools: &CoachPools<'a>,
    passengers: &[PassengerInput],
    order: &[usize],
    chart_prepared: bool,
) -> Option<(&'a str, Vec<(usize, &'a Seat)>)> {
    let mut claimed = HashSet::new();
    let mut seats = Vec::with_capacity(order.len());

    for &idx in order {
        let seat = pools.seat_for(&passengers[idx], chart_prepared, &claimed)?;
        claimed.insert(pools.key(seat));
        seats.push((idx, seat));
    }

    Some((pools.coach.code.as_str(), seats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rail_core::models::{BerthType, ClassType, PassengerStatus};

    const RESERVED: [i32; 2] = [1, 4];

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
    }

    fn passenger(age: i32, gender: Gender, disabled: bool) -> PassengerInput {
        PassengerInput {
            name: format!("P{}", age),
            age,
            gender,
            is_disabled: disabled,
            berth_preference: BerthPreference::NoPreference,
        }
    }

    fn adult() -> PassengerInput {
        passenger(30, Gender::Male, false)
    }

    fn occupy(coach: &Coach, numbers: impl IntoIterator<Item = i32>) -> HashSet<SeatKey> {
        numbers
            .into_iter()
            .map(|n| SeatKey::new(coach.code.as_str(), n))
            .collect()
    }

    struct Fixture {
        coaches: Vec<Coach>,
        occupied: HashSet<SeatKey>,
        booked: i64,
        rac_capacity: i64,
        as_of: NaiveDate,
    }

    impl Fixture {
        fn new(coaches: Vec<Coach>) -> Self {
            Self {
                coaches,
                occupied: HashSet::new(),
                booked: 0,
                rac_capacity: 0,
                as_of: date(1),
            }
        }

        fn run(&self, passengers: &[PassengerInput]) -> AllocationResult {
            allocate(&AllocationRequest {
                passengers,
                coaches: &self.coaches,
                occupied: &self.occupied,
                booked: self.booked,
                rac_capacity: self.rac_capacity,
                reserved_seat_numbers: &RESERVED,
                as_of: self.as_of,
                journey_date: date(3),
            })
        }
    }

    fn seat_of(a: &SeatAssignment) -> (String, i32) {
        (a.coach_code.clone().unwrap(), a.seat_number.unwrap())
    }

    #[test]
    fn test_senior_classification() {
        assert!(is_senior(&passenger(52, Gender::Male, false)));
        assert!(!is_senior(&passenger(51, Gender::Male, false)));
        assert!(is_senior(&passenger(45, Gender::Female, false)));
        assert!(!is_senior(&passenger(44, Gender::Female, false)));
        assert!(!is_senior(&passenger(45, Gender::Other, false)));
    }

    #[test]
    fn test_single_coach_group_fit_uses_general_pool() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 12);
        let fixture = Fixture::new(vec![coach.clone()]);

        let party = vec![adult(), adult(), adult()];
        let result = fixture.run(&party);

        assert_eq!(result.assignments.len(), 3);
        let seats: Vec<i32> = result
            .assignments
            .iter()
            .map(|a| {
                assert_eq!(a.status, PassengerStatus::Confirmed);
                assert_eq!(a.coach_code.as_deref(), Some("S1"));
                a.seat_number.unwrap()
            })
            .collect();
        assert_eq!(seats, vec![2, 3, 5]);

        let claimed: HashSet<SeatKey> = result.confirmed_seats().collect();
        let pools = CoachPools::new(&coach, &claimed, &RESERVED);
        assert_eq!(pools.general.len(), 10 - 3);
        assert_eq!(pools.reserved.len(), 2);
    }

    #[test]
    fn test_disabled_passenger_takes_reserved_seat() {
        let fixture = Fixture::new(vec![Coach::with_layout("12951", "S1", ClassType::Sleeper, 72)]);

        let party = vec![adult(), passenger(30, Gender::Female, true)];
        let result = fixture.run(&party);

        assert_eq!(result.assignments[1].seat_number, Some(1));
        assert_eq!(result.assignments[0].seat_number, Some(2));
    }

    #[test]
    fn test_disabled_falls_back_to_general() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, RESERVED);

        let result = fixture.run(&[passenger(60, Gender::Male, true)]);
        assert_eq!(result.assignments[0].seat_number, Some(2));
    }

    #[test]
    fn test_senior_reaches_reserved_pool_only_on_chart_day() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, [2, 3, 5, 6, 7, 8]);
        fixture.rac_capacity = 1;

        let senior = [passenger(65, Gender::Male, false)];

        let before = fixture.run(&senior);
        assert_eq!(before.assignments[0].status, PassengerStatus::Rac);
        assert!(before.assignments[0].seat_number.is_none());

        fixture.as_of = date(3);
        let same_day = fixture.run(&senior);
        assert_eq!(same_day.assignments[0].status, PassengerStatus::Confirmed);
        assert_eq!(same_day.assignments[0].seat_number, Some(1));

        // Not a senior, so never the reserved pool
        let young = fixture.run(&[adult()]);
        assert_eq!(young.assignments[0].status, PassengerStatus::Rac);
    }

    #[test]
    fn test_party_is_split_when_no_coach_fits() {
        let a = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let b = Coach::with_layout("12951", "S2", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![a.clone(), b.clone()]);
        fixture.occupied = occupy(&a, [2, 3, 5, 6]);
        fixture.occupied.extend(occupy(&b, [2, 3, 5]));

        let party = vec![adult(), adult(), adult(), adult()];
        let result = fixture.run(&party);

        let seats: Vec<(String, i32)> = result.assignments.iter().map(seat_of).collect();
        assert_eq!(
            seats,
            vec![
                ("S1".to_string(), 7),
                ("S1".to_string(), 8),
                ("S2".to_string(), 6),
                ("S2".to_string(), 7),
            ]
        );
    }

    #[test]
    fn test_group_prefers_later_coach_that_fits_everyone() {
        let a = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let b = Coach::with_layout("12951", "S2", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![a.clone(), b]);
        fixture.occupied = occupy(&a, [2, 3, 5, 6, 7]);

        let result = fixture.run(&[adult(), adult()]);
        assert!(result
            .assignments
            .iter()
            .all(|a| a.coach_code.as_deref() == Some("S2")));
    }

    #[test]
    fn test_blocked_passenger_moves_to_next_coach() {
        let a = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let b = Coach::with_layout("12951", "S2", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![a.clone(), b.clone()]);
        fixture.occupied = occupy(&a, [2, 3, 5, 6, 7, 8]);
        fixture.occupied.extend(occupy(&b, [1, 2, 3, 4, 5, 6, 7]));

        let party = vec![adult(), passenger(40, Gender::Male, true)];
        let result = fixture.run(&party);

        assert_eq!(seat_of(&result.assignments[0]), ("S2".to_string(), 8));
        assert_eq!(seat_of(&result.assignments[1]), ("S1".to_string(), 1));
    }

    #[test]
    fn test_berth_preference_is_advisory() {
        let fixture = Fixture::new(vec![Coach::with_layout("12951", "S1", ClassType::Sleeper, 72)]);

        let mut upper = adult();
        upper.berth_preference = BerthPreference::Upper;
        let mut side = adult();
        side.berth_preference = BerthPreference::SideUpper;

        let result = fixture.run(&[upper, side]);
        assert_eq!(result.assignments[0].seat_number, Some(3));
        assert_eq!(result.assignments[0].berth, Some(BerthType::Upper));
        assert_eq!(result.assignments[1].berth, Some(BerthType::SideUpper));

        // No window seats in a sleeper coach: falls back to the lowest seat
        let mut window = adult();
        window.berth_preference = BerthPreference::Window;
        let fallback = fixture.run(&[window]);
        assert_eq!(fallback.assignments[0].seat_number, Some(2));
    }

    #[test]
    fn test_overflow_to_waitlist() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 72);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, 1..=72);
        fixture.booked = 80;
        fixture.rac_capacity = 8;

        let result = fixture.run(&[adult()]);
        let outcome = &result.assignments[0];
        assert_eq!(outcome.status, PassengerStatus::Waitlisted);
        assert_eq!(outcome.position, Some(1));
        assert!(outcome.coach_code.is_none());
        assert!(outcome.seat_number.is_none());
        assert!(outcome.berth.is_none());
    }

    #[test]
    fn test_full_coach_fills_rac_buffer_in_request_order() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 72);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, 1..=72);
        fixture.booked = 72;
        fixture.rac_capacity = 8;

        let party = vec![adult(), passenger(70, Gender::Female, false)];
        let result = fixture.run(&party);
        assert_eq!(result.assignments[0], SeatAssignment::rac(1));
        assert_eq!(result.assignments[1], SeatAssignment::rac(2));
    }

    #[test]
    fn test_rac_then_waitlist_positions() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, 2..=8);
        fixture.booked = 7;
        fixture.rac_capacity = 1;

        let result = fixture.run(&[adult(), adult(), adult()]);
        let statuses: Vec<(PassengerStatus, Option<i32>)> = result
            .assignments
            .iter()
            .map(|a| (a.status, a.position))
            .collect();

        // Only reserved seat 1 is free, so nobody is confirmed and overflow
        // starts after the eight confirmed slots
        assert_eq!(
            statuses,
            vec![
                (PassengerStatus::Rac, Some(1)),
                (PassengerStatus::Waitlisted, Some(1)),
                (PassengerStatus::Waitlisted, Some(2)),
            ]
        );
    }

    #[test]
    fn test_repeat_bookings_after_general_pool_is_full() {
        let coach = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
        let mut fixture = Fixture::new(vec![coach.clone()]);
        fixture.occupied = occupy(&coach, [2, 3, 5, 6, 7, 8]);
        fixture.booked = 6;
        fixture.rac_capacity = 1;

        // Reserved seats 1 and 4 stay free, so booked never reaches capacity
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            let result = fixture.run(&[adult()]);
            let a = &result.assignments[0];
            outcomes.push((a.status, a.position));
            fixture.booked += 1;
        }

        assert_eq!(
            outcomes,
            vec![
                (PassengerStatus::Rac, Some(1)),
                (PassengerStatus::Waitlisted, Some(1)),
                (PassengerStatus::Waitlisted, Some(2)),
            ]
        );
    }

    #[test]
    fn test_no_coaches_waitlists_everyone() {
        let fixture = Fixture::new(Vec::new());
        let result = fixture.run(&[adult(), adult()]);
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.assignments[1].status, PassengerStatus::Waitlisted);
        assert_eq!(result.assignments[1].position, Some(2));
    }

    fn arb_passenger() -> impl Strategy<Value = PassengerInput> {
        (1i32..=125, 0u8..3, any::<bool>()).prop_map(|(age, g, disabled)| {
            let gender = match g {
                0 => Gender::Male,
                1 => Gender::Female,
                _ => Gender::Other,
            };
            passenger(age, gender, disabled)
        })
    }

    proptest! {
        #[test]
        fn prop_reserved_pool_holds_before_chart(
            party in prop::collection::vec(arb_passenger(), 1..=6),
            taken in prop::collection::hash_set(1i32..=24, 0..24),
            booked_extra in 0i64..10,
        ) {
            let a = Coach::with_layout("12951", "S1", ClassType::Sleeper, 8);
            let b = Coach::with_layout("12951", "S2", ClassType::Sleeper, 16);
            let occupied: HashSet<SeatKey> = taken
                .iter()
                .map(|&n| if n <= 8 { SeatKey::new("S1", n) } else { SeatKey::new("S2", n - 8) })
                .collect();
            let coaches = vec![a, b];

            let result = allocate(&AllocationRequest {
                passengers: &party,
                coaches: &coaches,
                occupied: &occupied,
                booked: occupied.len() as i64 + booked_extra,
                rac_capacity: 3,
                reserved_seat_numbers: &RESERVED,
                as_of: date(1),
                journey_date: date(3),
            });

            prop_assert_eq!(result.assignments.len(), party.len());

            let mut seen = HashSet::new();
            for (p, a) in party.iter().zip(&result.assignments) {
                if let Some(key) = a.seat_key() {
                    prop_assert!(!occupied.contains(&key));
                    prop_assert!(seen.insert(key.clone()));
                    if !p.is_disabled {
                        prop_assert!(!RESERVED.contains(&key.seat_number));
                    }
                } else {
                    prop_assert!(matches!(a.status, PassengerStatus::Rac | PassengerStatus::Waitlisted));
                    prop_assert!(a.position.unwrap_or(0) >= 1);
                }
            }
        }
    }
}

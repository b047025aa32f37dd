use super::*;

#[test]
fn period_is_the_larger_of_rate_and_interval() {
    assert_eq!(tick_period(10.0, 30), Duration::from_millis(100));
    assert_eq!(tick_period(100.0, 30), Duration::from_millis(30));
    assert_eq!(tick_period(0.0, 30), Duration::from_millis(30));
}

#[test]
fn on_time_ticks_keep_a_fixed_cadence() {
    let t0 = Instant::now();
    let mut s = TickSchedule::new(Duration::from_millis(100));
    assert_eq!(s.advance(t0), t0 + Duration::from_millis(100));
    assert_eq!(
        s.advance(t0 + Duration::from_millis(120)),
        t0 + Duration::from_millis(200)
    );
}

#[test]
fn late_ticks_do_not_burst() {
    let t0 = Instant::now();
    let mut s = TickSchedule::new(Duration::from_millis(100));
    s.advance(t0);
    let late = t0 + Duration::from_millis(450);
    assert_eq!(s.advance(late), late + Duration::from_millis(100));
}

#[test]
fn tiny_refresh_rate_clamps_instead_of_overflowing() {
    assert_eq!(tick_period(1e-30, 30), MAX_TICK_PERIOD);
    assert_eq!(tick_period(f64::MIN_POSITIVE, 30), MAX_TICK_PERIOD);
    assert_eq!(tick_period(1e-6, 30), MAX_TICK_PERIOD);
    assert_eq!(tick_period(10.0, u64::MAX), MAX_TICK_PERIOD);
}

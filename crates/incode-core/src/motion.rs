use crate::bindings::{KeyTable, LogicalAction};
use crate::config::Tuning;
use crate::error::Result;
use crate::filter::LowPass;
use crate::types::Point;
use std::time::Instant;

/// Output of one motion tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Wheel amounts to emit, one per held scroll key.
    pub scrolls: Vec<i32>,
    pub cursor: Point,
}

/// Integrates held movement keys into a target position and smooths it.
#[derive(Debug, Clone)]
pub struct Motion {
    tx: f64,
    ty: f64,
    fx: LowPass,
    fy: LowPass,
    last_tick: Option<Instant>,
}

impl Motion {
    pub fn new(tuning: &Tuning) -> Result<Self> {
        let fx = LowPass::new(
            tuning.tick_hz,
            tuning.filter_frequency,
            tuning.filter_resonance,
        )?;
        let fy = fx.clone();
        Ok(Self {
            tx: 0.0,
            ty: 0.0,
            fx,
            fy,
            last_tick: None,
        })
    }

    /// Restarts from `at` with no filter history.
    pub fn arm(&mut self, at: Point, now: Instant) {
        self.tx = at.x as f64;
        self.ty = at.y as f64;
        self.fx.set(self.tx);
        self.fy.set(self.ty);
        self.last_tick = Some(now);
    }

    pub fn target(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn step(&mut self, now: Instant, table: &KeyTable, tuning: &Tuning) -> TickOutput {
        let dt = self
            .last_tick
            .map_or(0.0, |t| now.saturating_duration_since(t).as_secs_f64());
        self.last_tick = Some(now);

        // Nothing held means no ramp at all, not a ramp from the epoch.
        let delta = match table.earliest_movement() {
            Some(earliest) => {
                let millis = now.saturating_duration_since(earliest).as_secs_f64() * 1000.0;
                let scale = tuning.accel * millis / 1000.0;
                dt * tuning.speed * scale
            }
            None => 0.0,
        };

        let mut scrolls = Vec::new();
        for (action, since) in table.held() {
            match action {
                LogicalAction::MoveUp => self.ty -= delta,
                LogicalAction::MoveDown => self.ty += delta,
                LogicalAction::MoveLeft => self.tx -= delta,
                LogicalAction::MoveRight => self.tx += delta,
                LogicalAction::ScrollUp | LogicalAction::ScrollDown => {
                    let amount = scroll_amount(now.saturating_duration_since(since).as_secs_f64(), tuning);
                    if amount != 0 {
                        let sign = action.scroll_sign().unwrap_or(1);
                        scrolls.push(sign * amount);
                    }
                }
                _ => {}
            }
        }

        let fx = self.fx.next(self.tx);
        let fy = self.fy.next(self.ty);

        TickOutput {
            scrolls,
            cursor: Point::new(round_half_away(fx), round_half_away(fy)),
        }
    }
}

/// Wheel amount for a scroll key held `ts` seconds.
pub fn scroll_amount(ts: f64, tuning: &Tuning) -> i32 {
    let factor = 1.0 + tuning.scroll_accel * ts;
    (ts * factor * tuning.scroll_scale).floor() as i32
}

/// Nearest integer, halves away from zero; desktops left of or above the
/// primary monitor have negative coordinates.
pub fn round_half_away(v: f64) -> i32 {
    if v < 0.0 {
        (v - 0.5) as i32
    } else {
        (v + 0.5) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScKey;
    use std::time::Duration;

    const RIGHT: ScKey = ScKey::new(0x21, false);
    const UP: ScKey = ScKey::new(0x12, false);
    const WHEEL_UP: ScKey = ScKey::new(0x13, false);
    const WHEEL_DOWN: ScKey = ScKey::new(0x2F, false);
    const BUTTON: ScKey = ScKey::new(0x39, false);

    fn table() -> KeyTable {
        KeyTable::from_bindings([
            (RIGHT, LogicalAction::MoveRight),
            (UP, LogicalAction::MoveUp),
            (WHEEL_UP, LogicalAction::ScrollUp),
            (WHEEL_DOWN, LogicalAction::ScrollDown),
            (BUTTON, LogicalAction::LeftButtonHold),
        ])
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_round_half_away() {
        assert_eq!(round_half_away(1.4), 1);
        assert_eq!(round_half_away(1.5), 2);
        assert_eq!(round_half_away(-1.4), -1);
        assert_eq!(round_half_away(-1.5), -2);
        assert_eq!(round_half_away(-0.2), 0);
    }

    #[test]
    fn test_idle_tick_holds_position() {
        let tuning = Tuning::default();
        let mut m = Motion::new(&tuning).unwrap();
        let t0 = Instant::now();
        m.arm(Point::new(-1200, 300), t0);

        let mut keys = table();
        keys.on_key_down(BUTTON, t0);
        for i in 1..50 {
            let out = m.step(t0 + ms(10 * i), &keys, &tuning);
            assert_eq!(out.cursor, Point::new(-1200, 300));
            assert!(out.scrolls.is_empty());
        }
        assert_eq!(m.target(), (-1200.0, 300.0));
    }

    #[test]
    fn test_right_hold_accelerates() {
        let tuning = Tuning {
            speed: 300.0,
            accel: 15.0,
            ..Tuning::default()
        };
        let mut m = Motion::new(&tuning).unwrap();
        let t0 = Instant::now();
        m.arm(Point::new(0, 0), t0);

        let mut keys = table();
        keys.on_key_down(RIGHT, t0);

        let mut xs = vec![0.0];
        for i in 1..=100 {
            m.step(t0 + ms(10 * i), &keys, &tuning);
            xs.push(m.target().0);
        }
        let steps: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.iter().all(|s| *s > 0.0));
        assert!(steps.windows(2).all(|w| w[1] > w[0]), "velocity must grow");
        assert_eq!(m.target().1, 0.0);
    }

    #[test]
    fn test_ramp_is_shared_by_directions() {
        let tuning = Tuning::default();
        let mut m = Motion::new(&tuning).unwrap();
        let t0 = Instant::now();
        m.arm(Point::new(0, 0), t0);

        let mut keys = table();
        keys.on_key_down(RIGHT, t0);
        m.step(t0 + ms(500), &keys, &tuning);
        let x_before = m.target().0;

        // UP joins late but inherits RIGHT's ramp.
        keys.on_key_down(UP, t0 + ms(500));
        m.step(t0 + ms(510), &keys, &tuning);
        let (x, y) = m.target();
        assert!((x - x_before + y).abs() < 1e-9);
        assert!(y < 0.0);
    }

    #[test]
    fn test_scroll_repeats_while_held() {
        let tuning = Tuning::default();
        let mut m = Motion::new(&tuning).unwrap();
        let t0 = Instant::now();
        m.arm(Point::new(0, 0), t0);

        let mut keys = table();
        keys.on_key_down(WHEEL_DOWN, t0);
        assert!(m.step(t0 + ms(10), &keys, &tuning).scrolls.is_empty());

        let out = m.step(t0 + ms(2000), &keys, &tuning);
        let expected = scroll_amount(2.0, &tuning);
        assert!(expected > 0);
        assert_eq!(out.scrolls, vec![-expected]);

        keys.on_key_down(WHEEL_UP, t0 + ms(2000));
        let out = m.step(t0 + ms(4000), &keys, &tuning);
        let mut scrolls = out.scrolls.clone();
        scrolls.sort();
        assert_eq!(scrolls, vec![-scroll_amount(4.0, &tuning), scroll_amount(2.0, &tuning)]);
    }

    #[test]
    fn test_filter_smooths_jump() {
        let tuning = Tuning::default();
        let mut m = Motion::new(&tuning).unwrap();
        let t0 = Instant::now();
        m.arm(Point::new(0, 0), t0);

        let mut keys = table();
        keys.on_key_down(RIGHT, t0);
        let out = m.step(t0 + ms(1000), &keys, &tuning);
        assert!((out.cursor.x as f64) < m.target().0);
    }
}

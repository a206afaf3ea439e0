//! Roulette opening: a strip of rewards scrolls past a fixed window, slows
//! down, and stops with the pre-rolled winner in the centre slot.
//!
//! Pure tick-driven state; the plugin decides how frames reach the player.

use rand::seq::SliceRandom;
use rand::Rng;
use scase_plugin_api::PluginItem;
use scase_registry::Crate;

/// Items on the strip.
pub const STRIP_LEN: usize = 50;
/// Strip index that always holds the winner.
pub const WINNER_INDEX: usize = 38;
/// Visible slots.
pub const WINDOW: usize = 7;
/// Ticks from first frame to stop.
pub const TOTAL_TICKS: u32 = 140;
/// Window offset after the stop; puts `WINNER_INDEX` in the middle slot.
pub const FINAL_POSITION: usize = WINNER_INDEX - WINDOW / 2;
/// Ticks the finished window stays open before closing.
pub const LINGER_TICKS: u32 = 60;
/// No click sounds during the last 28 ticks.
const CLICK_CUTOFF: u32 = TOTAL_TICKS - 28;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Nothing visible changed.
    Idle,
    /// The strip moved one slot. `click_pitch` is set while clicks are audible.
    Moved { click_pitch: Option<f32> },
    /// The strip stopped on the winner. Emitted exactly once.
    Finished,
    /// The linger period ran out; the window should close.
    Closed,
}

#[derive(Debug, Clone)]
pub struct Roulette {
    crate_name: String,
    strip: Vec<PluginItem>,
    winner: Option<PluginItem>,
    position: usize,
    ticks: u32,
    finished: bool,
    linger: u32,
}

impl Roulette {
    pub fn new<R: Rng + ?Sized>(krate: &Crate, rng: &mut R) -> Self {
        let winner = krate.random_item_with(rng);
        let candidates = krate.items();

        let strip = match &winner {
            Some(win) => {
                let mut strip: Vec<PluginItem> = (0..STRIP_LEN)
                    .filter_map(|_| candidates.choose(rng).cloned())
                    .collect();
                strip[WINNER_INDEX] = win.clone();
                strip
            }
            None => vec![empty_placeholder(); STRIP_LEN],
        };

        Self {
            crate_name: krate.name().to_string(),
            strip,
            winner,
            position: 0,
            ticks: 0,
            finished: false,
            linger: 0,
        }
    }

    pub fn crate_name(&self) -> &str {
        &self.crate_name
    }

    pub fn winner(&self) -> Option<&PluginItem> {
        self.winner.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Advance one game tick.
    pub fn tick(&mut self) -> Step {
        if self.finished {
            self.linger += 1;
            return if self.linger >= LINGER_TICKS {
                Step::Closed
            } else {
                Step::Idle
            };
        }

        if self.ticks >= TOTAL_TICKS {
            self.finished = true;
            self.position = FINAL_POSITION;
            return Step::Finished;
        }

        let step = if self.ticks % step_period(self.ticks) == 0 {
            self.position += 1;
            let click_pitch =
                (self.ticks < CLICK_CUTOFF).then(|| 0.5 + self.ticks as f32 / TOTAL_TICKS as f32);
            Step::Moved { click_pitch }
        } else {
            Step::Idle
        };
        self.ticks += 1;
        step
    }

    /// The `WINDOW` items currently visible, left to right.
    pub fn window(&self) -> Vec<PluginItem> {
        (0..WINDOW)
            .map(|i| self.strip[(self.position + i) % STRIP_LEN].clone())
            .collect()
    }
}

/// Ticks between strip moves: fast at first, slower as the spin runs out.
pub fn step_period(ticks: u32) -> u32 {
    let progress = ticks as f32 / TOTAL_TICKS as f32;
    if progress < 0.3 {
        2
    } else if progress < 0.6 {
        4
    } else if progress < 0.85 {
        8
    } else {
        15
    }
}

pub(crate) fn empty_placeholder() -> PluginItem {
    PluginItem::new("minecraft:barrier", 1).with_name("Empty crate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stocked() -> Crate {
        let mut c = Crate::new("Gold", PluginItem::new("minecraft:chest", 1));
        c.set_items(vec![
            PluginItem::new("minecraft:diamond", 1),
            PluginItem::new("minecraft:emerald", 1),
            PluginItem::new("minecraft:coal", 16),
        ]);
        c
    }

    fn run_to_finish(r: &mut Roulette) -> (u32, u32) {
        let mut calls = 0;
        let mut moves = 0;
        loop {
            calls += 1;
            match r.tick() {
                Step::Finished => return (calls, moves),
                Step::Moved { .. } => moves += 1,
                Step::Idle => {}
                Step::Closed => panic!("closed before finishing"),
            }
        }
    }

    #[test]
    fn step_period_slows_down() {
        assert_eq!(step_period(0), 2);
        assert_eq!(step_period(41), 2);
        assert_eq!(step_period(42), 4);
        assert_eq!(step_period(84), 8);
        assert_eq!(step_period(119), 15);
        assert_eq!(step_period(139), 15);
    }

    #[test]
    fn finishes_after_total_ticks_with_winner_centred() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut r = Roulette::new(&stocked(), &mut rng);
        let winner = r.winner().cloned().unwrap();

        let (calls, moves) = run_to_finish(&mut r);
        assert_eq!(calls, TOTAL_TICKS + 1);
        assert!(moves > 0);
        assert!(r.is_finished());

        let window = r.window();
        assert_eq!(window.len(), WINDOW);
        assert_eq!(window[WINDOW / 2], winner);
    }

    #[test]
    fn strip_only_holds_candidates() {
        let krate = stocked();
        let candidates = krate.items();
        let mut rng = StdRng::seed_from_u64(3);
        let mut r = Roulette::new(&krate, &mut rng);
        for _ in 0..TOTAL_TICKS {
            r.tick();
            assert!(r.window().iter().all(|i| candidates.contains(i)));
        }
    }

    #[test]
    fn clicks_stop_near_the_end() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut r = Roulette::new(&stocked(), &mut rng);
        let mut last_audible = None;
        for _ in 0..TOTAL_TICKS {
            let before = r.ticks();
            if let Step::Moved {
                click_pitch: Some(pitch),
            } = r.tick()
            {
                assert!((0.5..1.5).contains(&pitch));
                last_audible = Some(before);
            }
        }
        assert!(last_audible.unwrap() < CLICK_CUTOFF);
    }

    #[test]
    fn closes_after_linger() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut r = Roulette::new(&stocked(), &mut rng);
        run_to_finish(&mut r);
        for _ in 1..LINGER_TICKS {
            assert_eq!(r.tick(), Step::Idle);
        }
        assert_eq!(r.tick(), Step::Closed);
    }

    #[test]
    fn empty_crate_spins_placeholders_without_winner() {
        let empty = Crate::new("Empty", PluginItem::new("minecraft:chest", 1));
        let mut rng = StdRng::seed_from_u64(5);
        let mut r = Roulette::new(&empty, &mut rng);
        assert!(r.winner().is_none());
        run_to_finish(&mut r);
        assert!(r
            .window()
            .iter()
            .all(|i| i.id == "minecraft:barrier"));
    }
}

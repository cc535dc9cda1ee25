// The three carried resource meters: health (red), ammo (blue), stamina
// (green). Pure clamped arithmetic; the HUD observes changes and redraws.

use bevy::prelude::*;

pub const METER_MAX: f32 = 100.0;
/// Red meter loss per hazard contact. Three hits from full are fatal.
pub const HAZARD_STEP: f32 = 33.33;
/// Residue below this after a hit snaps to zero, so the third hit from a
/// full meter lands on exactly 0 instead of leaving float dust behind.
const HIT_SNAP: f32 = 0.05;
/// Blue meter cost per shot.
pub const AMMO_COST: f32 = 10.0;
/// Default green meter drain/recharge per tick; scripts may override.
pub const STAMINA_DRAIN: f32 = 1.0;
pub const STAMINA_RECHARGE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum HitOutcome {
    Survived,
    Defeated,
}

/// The single live meter block. Created all-full at campaign start and
/// carried as-is across every chapter transition; no chapter resets it.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct Meters {
    pub red: f32,
    pub blue: f32,
    pub green: f32,
}

impl Default for Meters {
    fn default() -> Self {
        Self {
            red: METER_MAX,
            blue: METER_MAX,
            green: METER_MAX,
        }
    }
}

impl Meters {
    /// One hazard contact. Reports `Defeated` only on the transition to
    /// zero, so a multi-hit tick still yields a single defeat signal.
    pub fn apply_hazard_hit(&mut self) -> HitOutcome {
        let before = self.red;
        self.red = (self.red - HAZARD_STEP).max(0.0);
        if self.red < HIT_SNAP {
            self.red = 0.0;
        }
        if before > 0.0 && self.red == 0.0 {
            HitOutcome::Defeated
        } else {
            HitOutcome::Survived
        }
    }

    /// Pays for one shot. Refuses silently when the meter cannot cover the
    /// cost; the caller then simply does not fire.
    pub fn spend_ammo(&mut self) -> bool {
        if self.blue < AMMO_COST {
            return false;
        }
        self.blue -= AMMO_COST;
        true
    }

    /// Per-tick stamina update. Returns the effective sprint state: holding
    /// sprint with an empty meter is refused outright.
    pub fn tick_stamina(&mut self, sprint_held: bool, drain: f32, recharge: f32) -> bool {
        if sprint_held && self.green > 0.0 {
            self.green = (self.green - drain).max(0.0);
            true
        } else {
            self.green = (self.green + recharge).min(METER_MAX);
            false
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn in_range(meters: &Meters) -> bool {
        [meters.red, meters.blue, meters.green]
            .iter()
            .all(|v| (0.0..=METER_MAX).contains(v))
    }

    #[test]
    fn three_hits_from_full_reach_exactly_zero() {
        let mut meters = Meters::default();
        assert_eq!(meters.apply_hazard_hit(), HitOutcome::Survived);
        assert!((meters.red - 66.67).abs() < 1e-4);
        assert_eq!(meters.apply_hazard_hit(), HitOutcome::Survived);
        assert!((meters.red - 33.34).abs() < 1e-4);
        assert_eq!(meters.apply_hazard_hit(), HitOutcome::Defeated);
        assert_eq!(meters.red, 0.0);
        // A further hit must not re-signal defeat.
        assert_eq!(meters.apply_hazard_hit(), HitOutcome::Survived);
        assert_eq!(meters.red, 0.0);
    }

    #[test]
    fn firing_below_cost_is_a_silent_no_op() {
        let mut meters = Meters {
            blue: 5.0,
            ..Meters::default()
        };
        assert!(!meters.spend_ammo());
        assert_eq!(meters.blue, 5.0);
    }

    #[test]
    fn ammo_does_not_regenerate_passively() {
        let mut meters = Meters::default();
        assert!(meters.spend_ammo());
        for _ in 0..100 {
            meters.tick_stamina(false, STAMINA_DRAIN, STAMINA_RECHARGE);
        }
        assert_eq!(meters.blue, 90.0);
    }

    #[test]
    fn sprint_is_refused_on_empty_stamina() {
        let mut meters = Meters {
            green: 0.0,
            ..Meters::default()
        };
        assert!(!meters.tick_stamina(true, STAMINA_DRAIN, STAMINA_RECHARGE));
    }

    #[test]
    fn stamina_recharge_caps_at_full() {
        let mut meters = Meters {
            green: 99.0,
            ..Meters::default()
        };
        meters.tick_stamina(false, STAMINA_DRAIN, STAMINA_RECHARGE);
        assert_eq!(meters.green, METER_MAX);
    }

    #[test]
    fn meters_stay_clamped_under_random_sequences() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let mut meters = Meters::default();
            for _ in 0..500 {
                match rng.random_range(0..3) {
                    0 => {
                        let _ = meters.apply_hazard_hit();
                    }
                    1 => {
                        let _ = meters.spend_ammo();
                    }
                    _ => {
                        let _ = meters.tick_stamina(
                            rng.random_bool(0.5),
                            STAMINA_DRAIN,
                            STAMINA_RECHARGE,
                        );
                    }
                }
                assert!(in_range(&meters), "meters out of range: {meters:?}");
            }
        }
    }
}

use tracing::debug;

use super::sprites::SpriteKind;

/// Uniform frame clock for a horizontal sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationClock {
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_count: u32,
    pub ticks_per_frame: u32,
}

impl AnimationClock {
    pub const fn new(
        frame_width: u32,
        frame_height: u32,
        frame_count: u32,
        ticks_per_frame: u32,
    ) -> Self {
        Self {
            frame_width,
            frame_height,
            frame_count: if frame_count == 0 { 1 } else { frame_count },
            ticks_per_frame: if ticks_per_frame == 0 { 1 } else { ticks_per_frame },
        }
    }

    /// Single-frame sheet; never advances.
    pub const fn still(frame_width: u32, frame_height: u32) -> Self {
        Self::new(frame_width, frame_height, 1, 1)
    }

    pub const fn full_cycle_period(&self) -> u64 {
        self.frame_count as u64 * self.ticks_per_frame as u64
    }

    /// Frame shown by instance `id` of `total` when the category clock reads `global_tick`.
    pub fn frame_at(&self, global_tick: u64, id: u32, total: u32) -> u32 {
        let period = self.full_cycle_period();
        let local = (global_tick % period + stagger_offset(id, total, period)) % period;
        (local / self.ticks_per_frame as u64) as u32
    }

    /// Frame `index` of the sheet as `(x, y, w, h)` in source pixels.
    pub fn source_rect(&self, frame: u32) -> (u32, u32, u32, u32) {
        let frame = frame % self.frame_count;
        (frame * self.frame_width, 0, self.frame_width, self.frame_height)
    }
}

/// Evenly spaced per-instance shift into a cycle of `period` ticks.
pub fn stagger_offset(id: u32, total: u32, period: u64) -> u64 {
    let total = u64::from(total.max(1));
    (u64::from(id) * period / total) % period.max(1)
}

/// Independent tick counters. Every category advances once per rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockCategory {
    Terrain,
    Foliage,
    Livestock,
    Units,
    Player,
}

impl ClockCategory {
    pub const ALL: [ClockCategory; 5] = [
        ClockCategory::Terrain,
        ClockCategory::Foliage,
        ClockCategory::Livestock,
        ClockCategory::Units,
        ClockCategory::Player,
    ];

    const fn index(self) -> usize {
        match self {
            ClockCategory::Terrain => 0,
            ClockCategory::Foliage => 1,
            ClockCategory::Livestock => 2,
            ClockCategory::Units => 3,
            ClockCategory::Player => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorPhase {
    A,
    B,
}

/// Two-phase cycle: phase A plays `repeats_of_a` times, then phase B once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorSpec {
    pub sprite_a: SpriteKind,
    pub sprite_b: SpriteKind,
    pub duration_a: u32,
    pub repeats_of_a: u32,
    pub duration_b: u32,
}

impl BehaviorSpec {
    pub const fn grazing_sheep() -> Self {
        Self {
            sprite_a: SpriteKind::SheepIdle,
            sprite_b: SpriteKind::SheepGraze,
            duration_a: 90,
            repeats_of_a: 3,
            duration_b: 180,
        }
    }

    pub const fn combined_period(&self) -> u64 {
        let period = self.duration_a as u64 * self.repeats_of_a as u64 + self.duration_b as u64;
        if period == 0 {
            1
        } else {
            period
        }
    }

    /// Sprite and frame for instance `id` of `total`, staggered across the combined period.
    pub fn sample(
        &self,
        global_tick: u64,
        id: u32,
        total: u32,
    ) -> (SpriteKind, BehaviorPhase, u32) {
        let period = self.combined_period();
        let local = (global_tick % period + stagger_offset(id, total, period)) % period;
        let a_section = self.duration_a as u64 * self.repeats_of_a as u64;
        if local < a_section {
            let clock = self.sprite_a.clock();
            let frame = (local / clock.ticks_per_frame as u64) % clock.frame_count as u64;
            (self.sprite_a, BehaviorPhase::A, frame as u32)
        } else {
            let clock = self.sprite_b.clock();
            let into_b = local - a_section;
            let frame = (into_b / clock.ticks_per_frame as u64) % clock.frame_count as u64;
            (self.sprite_b, BehaviorPhase::B, frame as u32)
        }
    }
}

/// Stateful class clock. [`BehaviorSpec::sample`] for instance 0 of 1 reads
/// the same phase from the category tick without per-instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorCycle {
    spec: BehaviorSpec,
    phase: BehaviorPhase,
    phase_tick: u32,
    repeats_seen: u32,
}

impl BehaviorCycle {
    pub fn new(spec: BehaviorSpec) -> Self {
        Self {
            spec,
            phase: BehaviorPhase::A,
            phase_tick: 0,
            repeats_seen: 0,
        }
    }

    pub fn phase(&self) -> BehaviorPhase {
        self.phase
    }

    pub fn phase_tick(&self) -> u32 {
        self.phase_tick
    }

    pub fn repeats_seen(&self) -> u32 {
        self.repeats_seen
    }

    pub fn advance(&mut self) {
        self.phase_tick = self.phase_tick.saturating_add(1);
        match self.phase {
            BehaviorPhase::A if self.phase_tick >= self.spec.duration_a => {
                self.phase_tick = 0;
                self.repeats_seen += 1;
                if self.repeats_seen >= self.spec.repeats_of_a {
                    self.phase = BehaviorPhase::B;
                    self.repeats_seen = 0;
                }
            }
            BehaviorPhase::B if self.phase_tick >= self.spec.duration_b => {
                self.phase_tick = 0;
                self.phase = BehaviorPhase::A;
            }
            _ => {}
        }
    }
}

/// Entity classes driven by a shared [`BehaviorCycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorClass {
    Sheep,
}

impl BehaviorClass {
    pub const fn spec(self) -> BehaviorSpec {
        match self {
            BehaviorClass::Sheep => BehaviorSpec::grazing_sheep(),
        }
    }

    pub const fn category(self) -> ClockCategory {
        match self {
            BehaviorClass::Sheep => ClockCategory::Livestock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorFrame {
    pub sprite: SpriteKind,
    pub phase: BehaviorPhase,
    pub frame: u32,
}

#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    global_ticks: [u64; ClockCategory::ALL.len()],
    behaviors: Vec<(BehaviorClass, BehaviorCycle)>,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            global_ticks: [0; ClockCategory::ALL.len()],
            behaviors: vec![(
                BehaviorClass::Sheep,
                BehaviorCycle::new(BehaviorClass::Sheep.spec()),
            )],
        }
    }

    pub fn tick(&mut self) {
        for tick in &mut self.global_ticks {
            *tick = tick.wrapping_add(1);
        }
        for (class, cycle) in &mut self.behaviors {
            let before = cycle.phase();
            cycle.advance();
            if cycle.phase() != before {
                debug!(class = ?class, phase = ?cycle.phase(), "behavior_phase_changed");
            }
        }
    }

    pub fn global_tick(&self, category: ClockCategory) -> u64 {
        self.global_ticks[category.index()]
    }

    /// Frame for a sprite on its own category clock.
    pub fn frame_for(&self, sprite: SpriteKind, id: u32, total: u32) -> u32 {
        self.frame_in(sprite.category(), sprite, id, total)
    }

    /// Frame for a sprite sampled on an explicit category clock.
    pub fn frame_in(
        &self,
        category: ClockCategory,
        sprite: SpriteKind,
        id: u32,
        total: u32,
    ) -> u32 {
        sprite.clock().frame_at(self.global_tick(category), id, total)
    }

    pub fn behavior_frame(&self, class: BehaviorClass, id: u32, total: u32) -> BehaviorFrame {
        let (sprite, phase, frame) =
            class.spec().sample(self.global_tick(class.category()), id, total);
        BehaviorFrame {
            sprite,
            phase,
            frame,
        }
    }

    /// Class-wide phase of the shared cycle, before per-instance staggering.
    pub fn behavior_phase(&self, class: BehaviorClass) -> Option<BehaviorPhase> {
        self.behaviors
            .iter()
            .find(|(registered, _)| *registered == class)
            .map(|(_, cycle)| cycle.phase())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::app::sprites::UnitClass;

    #[test]
    fn zero_frame_count_and_speed_are_normalized() {
        let clock = AnimationClock::new(64, 64, 0, 0);
        assert_eq!(clock.frame_count, 1);
        assert_eq!(clock.ticks_per_frame, 1);
        assert_eq!(clock.frame_at(12345, 3, 0), 0);
    }

    #[test]
    fn offsets_are_distinct_and_evenly_spaced() {
        let period = SpriteKind::UnitIdle(UnitClass::Lancer).clock().full_cycle_period();
        for total in [1u32, 2, 5, 7, 12, 180] {
            let offsets: Vec<u64> = (0..total)
                .map(|id| stagger_offset(id, total, period))
                .collect();
            let unique: HashSet<u64> = offsets.iter().copied().collect();
            assert_eq!(unique.len(), total as usize, "total={total}");

            let min = offsets.iter().copied().min().expect("min");
            let max = offsets.iter().copied().max().expect("max");
            let spacing = period / total as u64;
            assert!(period - (max - min) <= spacing + 1, "total={total}");
        }
    }

    #[test]
    fn offsets_tie_only_when_instances_exceed_period() {
        let period = 4;
        let offsets: HashSet<u64> = (0..8).map(|id| stagger_offset(id, 8, period)).collect();
        assert_eq!(offsets.len(), 4);
    }

    #[test]
    fn frame_advances_every_ticks_per_frame() {
        let clock = SpriteKind::Bush.clock();
        assert_eq!(clock.frame_at(0, 0, 1), 0);
        assert_eq!(clock.frame_at(14, 0, 1), 0);
        assert_eq!(clock.frame_at(15, 0, 1), 1);
        assert_eq!(clock.frame_at(clock.full_cycle_period(), 0, 1), 0);
    }

    #[test]
    fn staggered_instance_starts_mid_cycle() {
        let clock = SpriteKind::Foam.clock();
        // period 160, half of it is 80 ticks, 8 frames in
        assert_eq!(clock.frame_at(0, 1, 2), 8);
    }

    #[test]
    fn frame_lookup_is_pure_and_needs_no_registration() {
        let mut scheduler = AnimationScheduler::new();
        for _ in 0..37 {
            scheduler.tick();
        }
        let tree = SpriteKind::Tree;
        let first = scheduler.frame_for(tree, 2, 9);
        let second = scheduler.frame_for(tree, 2, 9);
        assert_eq!(first, second);
        assert_eq!(first, tree.clock().frame_at(37, 2, 9));
        assert_eq!(scheduler.frame_for(tree, 40, 41), tree.clock().frame_at(37, 40, 41));
    }

    #[test]
    fn every_category_advances_once_per_tick() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.tick();
        scheduler.tick();
        for category in ClockCategory::ALL {
            assert_eq!(scheduler.global_tick(category), 2);
        }
    }

    #[test]
    fn grazing_cycle_runs_three_idle_runs_then_grazes() {
        let mut cycle = BehaviorCycle::new(BehaviorSpec::grazing_sheep());
        let mut phases = Vec::new();
        let mut idle_restarts = 0;
        for tick in 0..900u32 {
            phases.push(cycle.phase());
            let before = cycle.repeats_seen();
            cycle.advance();
            if cycle.phase() == BehaviorPhase::A && cycle.repeats_seen() > before {
                idle_restarts += 1;
            }
            if tick == 89 || tick == 179 {
                assert_eq!(cycle.phase_tick(), 0, "idle run restarts at tick {tick}");
            }
        }

        assert!(phases[..270].iter().all(|phase| *phase == BehaviorPhase::A));
        assert!(phases[270..450].iter().all(|phase| *phase == BehaviorPhase::B));
        assert!(phases[450..720].iter().all(|phase| *phase == BehaviorPhase::A));
        assert!(phases[720..900].iter().all(|phase| *phase == BehaviorPhase::B));
        assert_eq!(idle_restarts, 4);
    }

    #[test]
    fn sampled_behavior_matches_cycle_for_unstaggered_instance() {
        let spec = BehaviorSpec::grazing_sheep();
        let mut cycle = BehaviorCycle::new(spec);
        for tick in 0..1000u64 {
            let (_, phase, _) = spec.sample(tick, 0, 1);
            assert_eq!(phase, cycle.phase(), "tick={tick}");
            cycle.advance();
        }
    }

    #[test]
    fn sampled_behavior_frames_follow_phase_sprite() {
        let spec = BehaviorSpec::grazing_sheep();
        assert_eq!(spec.combined_period(), 450);

        let (sprite, _, frame) = spec.sample(0, 0, 1);
        assert_eq!((sprite, frame), (SpriteKind::SheepIdle, 0));
        let (sprite, _, frame) = spec.sample(105, 0, 1);
        assert_eq!((sprite, frame), (SpriteKind::SheepIdle, 1));
        let (sprite, _, frame) = spec.sample(270 + 31, 0, 1);
        assert_eq!((sprite, frame), (SpriteKind::SheepGraze, 2));
    }

    #[test]
    fn staggered_sheep_do_not_graze_in_lockstep() {
        let mut scheduler = AnimationScheduler::new();
        for _ in 0..10 {
            scheduler.tick();
        }
        let phases: HashSet<BehaviorPhase> = (0..5)
            .map(|id| scheduler.behavior_frame(BehaviorClass::Sheep, id, 5).phase)
            .collect();
        assert_eq!(phases.len(), 2);
        assert_eq!(
            scheduler.behavior_phase(BehaviorClass::Sheep),
            Some(BehaviorPhase::A)
        );
    }

    #[test]
    fn class_cycle_phase_matches_unstaggered_sample_every_tick() {
        let mut scheduler = AnimationScheduler::new();
        for tick in 1..=900u32 {
            scheduler.tick();
            let sampled = scheduler.behavior_frame(BehaviorClass::Sheep, 0, 1).phase;
            assert_eq!(
                scheduler.behavior_phase(BehaviorClass::Sheep),
                Some(sampled),
                "tick={tick}"
            );
        }
    }
}

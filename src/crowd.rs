//! Cosmetic audience that reacts to revealed answers
//!
//! Pure presentation state: the game loop feeds it `Revealed` events and
//! frame times, and clients draw whatever positions it reports.

use serde::{Deserialize, Serialize};

use crate::player::RandomSource;
use crate::types::PlayerKind;

pub const MIN_WIDTH: f64 = 600.0;
pub const MIN_HEIGHT: f64 = 700.0;
/// Walking speed in pixels per second
pub const MEMBER_SPEED: f64 = 300.0;
const JITTER: f64 = 50.0;

/// Screen dimensions shared by everything that positions sprites
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
        }
    }
}

impl Layout {
    /// Layout for a new window size, clamped to the minimum playable area
    pub fn resized(&self, width: f64, height: f64) -> Layout {
        Layout {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Still on the stand
    Neutral,
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub pos: Point,
    pub target: Point,
    pub side: Side,
    /// Which of the two sprite looks to use
    pub variant: u8,
}

/// Move `pos` towards `target` by `speed * dt`, landing exactly on the
/// target instead of overshooting it
pub fn step_towards(pos: Point, target: Point, speed: f64, dt: f64) -> Point {
    let dx = target.x - pos.x;
    let dy = target.y - pos.y;
    let distance = dx.hypot(dy);
    if distance == 0.0 {
        return pos;
    }

    let step = speed * dt;
    if step >= distance {
        return target;
    }
    Point {
        x: pos.x + dx / distance * step,
        y: pos.y + dy / distance * step,
    }
}

pub struct Crowd {
    layout: Layout,
    members: Vec<Member>,
    rng: Box<dyn RandomSource>,
}

impl std::fmt::Debug for Crowd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crowd")
            .field("layout", &self.layout)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

impl Crowd {
    pub fn new(size: usize, layout: Layout, mut rng: Box<dyn RandomSource>) -> Self {
        let members = (0..size)
            .map(|_| {
                let pos = Point {
                    x: layout.width / 2.0 + rng.uniform(-JITTER, JITTER),
                    y: layout.height * 0.7 + rng.uniform(-JITTER, JITTER),
                };
                Member {
                    pos,
                    target: pos,
                    side: Side::Neutral,
                    variant: rng.index(2) as u8 + 1,
                }
            })
            .collect();

        Self {
            layout,
            members,
            rng,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Send up to `points` members from the stand to the scorer's side
    pub fn react(&mut self, by: PlayerKind, points: u32) {
        let (side, target_x) = match by {
            PlayerKind::Human => (Side::Human, self.layout.width * 0.2),
            PlayerKind::Ai => (Side::Ai, self.layout.width * 0.8),
        };

        let mut moved = 0;
        for member in &mut self.members {
            if moved >= points {
                break;
            }
            if member.side != Side::Neutral {
                continue;
            }
            member.side = side;
            member.target.x = target_x + self.rng.uniform(-JITTER, JITTER);
            moved += 1;
        }
    }

    /// Advance every member's walk by `dt` seconds
    pub fn step(&mut self, dt: f64) {
        for member in &mut self.members {
            member.pos = step_towards(member.pos, member.target, MEMBER_SPEED, dt);
        }
    }

    /// Everyone back on the stand, at the start of every round
    pub fn reset(&mut self) {
        for member in &mut self.members {
            let pos = Point {
                x: self.layout.width / 2.0 + self.rng.uniform(-JITTER, JITTER),
                y: self.layout.height * 0.62 + self.rng.uniform(-JITTER, JITTER),
            };
            member.pos = pos;
            member.target = pos;
            member.side = Side::Neutral;
        }
    }

    /// Keep every member at the same relative place on a resized screen
    pub fn rescale(&mut self, layout: Layout) {
        let old = self.layout;
        let scale = |p: Point| Point {
            x: p.x / old.width * layout.width,
            y: p.y / old.height * layout.height,
        };
        for member in &mut self.members {
            member.pos = scale(member.pos);
            member.target = scale(member.target);
        }
        self.layout = layout;
    }

    /// Whether anyone is still walking
    pub fn is_moving(&self) -> bool {
        self.members.iter().any(|m| m.pos != m.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ScriptedRandom;

    fn near(p: Point, x: f64, y: f64) -> bool {
        (p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6
    }

    fn crowd(size: usize) -> Crowd {
        // exhausted script: every jitter is -50 and every variant is 1
        Crowd::new(size, Layout::default(), Box::new(ScriptedRandom::default()))
    }

    #[test]
    fn test_layout_resized_has_minimum() {
        let layout = Layout::default().resized(320.0, 1080.0);
        assert_eq!(layout, Layout { width: 600.0, height: 1080.0 });
    }

    #[test]
    fn test_step_towards_snaps_to_target() {
        let pos = Point { x: 0.0, y: 0.0 };
        let target = Point { x: 3.0, y: 4.0 };

        let halfway = step_towards(pos, target, 2.5, 1.0);
        assert!((halfway.x - 1.5).abs() < 1e-9);
        assert!((halfway.y - 2.0).abs() < 1e-9);

        assert_eq!(step_towards(pos, target, 300.0, 1.0), target);
        assert_eq!(step_towards(target, target, 300.0, 1.0), target);
    }

    #[test]
    fn test_members_start_on_the_stand() {
        let crowd = crowd(10);
        assert_eq!(crowd.members().len(), 10);
        for member in crowd.members() {
            assert_eq!(member.side, Side::Neutral);
            assert!(near(member.pos, 450.0, 440.0));
            assert_eq!(member.variant, 1);
        }
        assert!(!crowd.is_moving());
    }

    #[test]
    fn test_react_moves_up_to_points_members() {
        let mut crowd = crowd(10);
        crowd.react(PlayerKind::Human, 4);
        crowd.react(PlayerKind::Ai, 3);

        let sides: Vec<Side> = crowd.members().iter().map(|m| m.side).collect();
        assert_eq!(sides.iter().filter(|s| **s == Side::Human).count(), 4);
        assert_eq!(sides.iter().filter(|s| **s == Side::Ai).count(), 3);
        assert!((crowd.members()[0].target.x - 150.0).abs() < 1e-6);
        assert!((crowd.members()[4].target.x - 750.0).abs() < 1e-6);

        // only three left on the stand
        crowd.react(PlayerKind::Human, 30);
        assert!(crowd.members().iter().all(|m| m.side != Side::Neutral));
    }

    #[test]
    fn test_step_walks_at_member_speed() {
        let mut crowd = crowd(1);
        crowd.react(PlayerKind::Human, 1);
        assert!(crowd.is_moving());

        crowd.step(0.5);
        assert!((crowd.members()[0].pos.x - 300.0).abs() < 1e-9);
        crowd.step(1.0);
        assert_eq!(crowd.members()[0].pos, crowd.members()[0].target);
        assert!(!crowd.is_moving());
    }

    #[test]
    fn test_reset_returns_everyone() {
        let mut crowd = crowd(5);
        crowd.react(PlayerKind::Ai, 5);
        crowd.step(10.0);
        crowd.reset();

        for member in crowd.members() {
            assert_eq!(member.side, Side::Neutral);
            assert!(near(member.pos, 450.0, 384.0));
            assert_eq!(member.pos, member.target);
        }
    }

    #[test]
    fn test_rescale_is_proportional() {
        let mut crowd = crowd(1);
        let layout = crowd.layout().resized(2000.0, 1400.0);
        crowd.rescale(layout);

        assert_eq!(crowd.layout(), layout);
        assert!(near(crowd.members()[0].pos, 900.0, 880.0));
        assert!(!crowd.is_moving());
    }
}

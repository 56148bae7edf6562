use std::cell::{Cell, RefCell};

use embassy_futures::block_on;
use quadruped_gait::kinematics::gait_engine::GaitEngine;
use quadruped_gait::kinematics::motion::{Actuator, Cancelled, CommandSource};
use quadruped_gait::robot::commands::{GaitCommand, ServoCommand};
use quadruped_gait::robot::config::*;
use quadruped_gait::robot::joint::{Pose, Role, ServoChannel};
use quadruped_gait::robot::leg::{Direction, Leg};

#[derive(Debug, Clone, Copy)]
enum Event {
    Stop,
    Height(u8),
    Turn(Direction),
}

/// Command source whose values change when a given commit starts.
struct World {
    direction: Cell<Direction>,
    stop: Cell<bool>,
    height: Cell<u8>,
    script: RefCell<Vec<(usize, Event)>>,
}

impl World {
    fn new() -> Self {
        Self {
            direction: Cell::new(Direction::Forward),
            stop: Cell::new(false),
            height: Cell::new(BODY_HEIGHT_DEFAULT),
            script: RefCell::new(Vec::new()),
        }
    }

    fn facing(direction: Direction) -> Self {
        let world = Self::new();
        world.direction.set(direction);
        world
    }

    /// Fire `event` while commit number `commit` (counting from 1) is moving.
    fn at(self, commit: usize, event: Event) -> Self {
        self.script.borrow_mut().push((commit, event));
        self
    }

    fn fire(&self, commit: usize) {
        for (_, event) in self.script.borrow().iter().filter(|(at, _)| *at == commit) {
            match *event {
                Event::Stop => self.stop.set(true),
                Event::Height(height) => self.height.set(height),
                Event::Turn(direction) => self.direction.set(direction),
            }
        }
    }
}

impl CommandSource for World {
    fn direction(&self) -> Direction {
        self.direction.get()
    }

    fn stop_requested(&self) -> bool {
        self.stop.get()
    }

    fn body_height(&self) -> u8 {
        self.height.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Commit {
    All(Pose),
    One(ServoChannel, u8),
}

/// Actuator that records every command and finishes each move after one wait.
struct Recorder<'a> {
    world: &'a World,
    pose: Pose,
    target: Pose,
    moving: bool,
    log: Vec<Commit>,
}

impl<'a> Recorder<'a> {
    fn new(world: &'a World) -> Self {
        Self {
            world,
            pose: Pose::uniform(PIVOT_NEUTRAL).with_lifts(BODY_HEIGHT_DEFAULT),
            target: Pose::uniform(PIVOT_NEUTRAL),
            moving: false,
            log: Vec::new(),
        }
    }
}

impl Actuator for Recorder<'_> {
    async fn start(&mut self, cmd: ServoCommand) {
        self.target = self.pose;
        for m in cmd.moves.iter() {
            self.target[m.channel] = m.target;
        }
        let entry = match cmd.moves.as_slice() {
            [single] => Commit::One(single.channel, single.target),
            _ => Commit::All(self.target),
        };
        self.log.push(entry);
        self.world.fire(self.log.len());
        self.moving = true;
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    async fn wait(&mut self) {
        self.pose = self.target;
        self.moving = false;
    }

    async fn halt(&mut self) {
        self.moving = false;
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}

fn engine(world: &World) -> GaitEngine<Recorder<'_>, &World> {
    GaitEngine::new(Recorder::new(world), world, MotionConfig::default())
}

fn log<'a>(engine: &'a GaitEngine<Recorder<'_>, &World>) -> &'a [Commit] {
    &engine.motion().actuator().log
}

fn synchronized(engine: &GaitEngine<Recorder<'_>, &World>) -> Vec<Pose> {
    log(engine)
        .iter()
        .filter_map(|commit| match commit {
            Commit::All(pose) => Some(*pose),
            Commit::One(..) => None,
        })
        .collect()
}

fn lifted_legs(pose: &Pose) -> Vec<Leg> {
    Leg::ALL
        .into_iter()
        .filter(|leg| pose.lift(*leg) > BODY_HEIGHT_DEFAULT)
        .collect()
}

#[test]
fn trot_two_cycles_alternates_diagonal_pairs() {
    let world = World::new();
    let mut gait = engine(&world);

    assert_eq!(block_on(gait.trot(2)), Ok(()));

    let poses = synchronized(&gait);
    assert_eq!(poses.len(), 4);
    assert_eq!(log(&gait).len(), 4);

    let lift = 115;
    assert_eq!(
        poses[0].angles(),
        &[90, 80, 90, lift, 30, 80, 150, lift],
        "front left, back left, back right, front right"
    );
    assert_eq!(poses[1].angles(), &[30, lift, 150, 80, 90, lift, 90, 80]);
    assert_eq!(poses[2], poses[0]);
    assert_eq!(poses[3], poses[1]);
    assert_eq!(lifted_legs(&poses[0]), [Leg::BackLeft, Leg::FrontRight]);
    assert_eq!(lifted_legs(&poses[1]), [Leg::FrontLeft, Leg::BackRight]);
}

#[test]
fn commit_count_scales_with_cycles() {
    for cycles in 1..=4u16 {
        let world = World::new();
        let mut gait = engine(&world);
        block_on(gait.trot(cycles)).unwrap();
        assert_eq!(synchronized(&gait).len(), 2 * cycles as usize, "trot x{cycles}");

        let world = World::facing(Direction::Left);
        let mut gait = engine(&world);
        block_on(gait.turn(cycles)).unwrap();
        assert_eq!(synchronized(&gait).len(), 1 + cycles as usize, "turn x{cycles}");

        let world = World::new();
        let mut gait = engine(&world);
        block_on(gait.creep(cycles)).unwrap();
        assert_eq!(synchronized(&gait).len(), 1 + 6 * cycles as usize, "creep x{cycles}");
    }
}

#[test]
fn trot_picks_up_new_direction_at_cycle_boundary() {
    let world = World::new().at(1, Event::Turn(Direction::Left));
    let mut gait = engine(&world);

    block_on(gait.trot(2)).unwrap();
    let poses = synchronized(&gait);

    // second phase of the first cycle still walks forward
    assert_eq!(poses[1].angles(), &[30, 115, 150, 80, 90, 115, 90, 80]);
    // the next cycle hands every leg's angles to the leg one step along the ring
    assert_eq!(poses[2].pivot(Leg::BackLeft), poses[0].pivot(Leg::FrontLeft));
    assert_eq!(poses[2].pivot(Leg::FrontLeft), poses[0].pivot(Leg::FrontRight));
    assert_eq!(poses[2].lift(Leg::BackRight), poses[0].lift(Leg::BackLeft));
    assert_eq!(lifted_legs(&poses[2]), [Leg::FrontLeft, Leg::BackRight]);
}

#[test]
fn trot_follows_body_height_changes() {
    let world = World::new().at(1, Event::Height(100));
    let mut gait = engine(&world);

    block_on(gait.trot(2)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(poses.len(), 5);
    // correction keeps the pivots and levels every foot at the new height
    for leg in Leg::ALL {
        assert_eq!(poses[1].pivot(leg), poses[0].pivot(leg));
        assert_eq!(poses[1].lift(leg), 100);
    }
    assert_eq!(poses[2].lift(Leg::BackLeft), 100);
    assert_eq!(poses[3].lift(Leg::FrontLeft), 100);
    assert_eq!(poses[3].lift(Leg::BackLeft), 125);
}

#[test]
fn creep_follows_body_height_changes() {
    let world = World::new().at(3, Event::Height(100));
    let mut gait = engine(&world);

    block_on(gait.creep(1)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(poses.len(), 8);
    assert_eq!(poses[2].angles(), &[75, 80, 105, 80, 120, 80, 60, 80]);
    assert_eq!(poses[3].angles(), &[75, 100, 105, 100, 120, 100, 60, 100]);
    assert_eq!(poses[4].lift(Leg::FrontLeft), 100);
    assert_eq!(poses[4].lift(Leg::BackLeft), LIFT_MAX_ANGLE);
    assert_eq!(
        log(&gait).last(),
        Some(&Commit::One(ServoChannel::new(Leg::BackRight, Role::Lift), 100))
    );
}

#[test]
fn turn_issues_no_height_correction() {
    let world = World::facing(Direction::Left).at(2, Event::Height(100));
    let mut gait = engine(&world);

    block_on(gait.turn(3)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(log(&gait).len(), 4);
    // the next quarter turn puts its grounded feet at the new height anyway
    assert_eq!(poses[2].lift(Leg::FrontLeft), 100);
    assert_eq!(poses[2].lift(Leg::BackLeft), LIFT_MAX_ANGLE);
}

#[test]
fn turn_stopped_during_second_commit() {
    let world = World::facing(Direction::Left).at(2, Event::Stop);
    let mut gait = engine(&world);

    assert_eq!(block_on(gait.turn(3)), Err(Cancelled));
    assert_eq!(log(&gait).len(), 2);
}

#[test]
fn turn_left_stabilizes_then_walks_the_ring_forward() {
    let world = World::facing(Direction::Left);
    let mut gait = engine(&world);

    block_on(gait.turn(6)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(poses[0].angles(), &[90, 80, 90, 80, 90, 80, 120, 80]);
    assert_eq!(poses[1].angles(), &[120, LIFT_MAX_ANGLE, 80, 80, 80, 80, 110, 80]);
    for (k, pose) in poses.iter().enumerate().skip(1) {
        let active = Leg::FrontLeft.offset((k - 1) as i8);
        assert_eq!(lifted_legs(pose), [active]);
        assert_eq!(pose.pivot(active), PIVOT_NEUTRAL + TURN_MOVE_ANGLE);
    }
}

#[test]
fn turn_right_walks_the_ring_backward() {
    let world = World::facing(Direction::Right);
    let mut gait = engine(&world);

    block_on(gait.turn(5)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(poses[0].pivot(Leg::BackLeft), PIVOT_NEUTRAL - TURN_MOVE_ANGLE);
    assert_eq!(poses[1].pivot(Leg::BackLeft), PIVOT_NEUTRAL - TURN_MOVE_ANGLE + TURN_BODY_ANGLE);
    for (k, pose) in poses.iter().enumerate().skip(1) {
        let active = Leg::FrontLeft.offset(-((k - 1) as i8));
        assert_eq!(lifted_legs(pose), [active]);
        assert_eq!(pose.pivot(active), PIVOT_NEUTRAL - TURN_MOVE_ANGLE);
    }
}

#[test]
fn creep_sets_up_y_stance_then_mirrors_second_half() {
    let world = World::new();
    let mut gait = engine(&world);

    assert_eq!(block_on(gait.creep(1)), Ok(()));
    let poses = synchronized(&gait);
    assert_eq!(poses.len(), 7);

    assert_eq!(poses[0].angles(), &[120, 80, 60, 80, 75, 80, 105, 80]);
    assert_eq!(lifted_legs(&poses[1]), [Leg::FrontRight]);
    assert_eq!(poses[1].pivot(Leg::FrontRight), Y_POSITION_FRONT_ANGLE);
    assert!(lifted_legs(&poses[2]).is_empty());
    assert_eq!(lifted_legs(&poses[3]), [Leg::BackLeft]);

    for phase in 0..3 {
        let first = &poses[1 + phase];
        let second = &poses[4 + phase];
        for leg in Leg::ALL {
            assert_eq!(second.pivot(leg.mirrored()), MAX_ANGLE - first.pivot(leg));
            assert_eq!(second.lift(leg.mirrored()), first.lift(leg));
        }
    }

    // the last closed leg is put down on its own
    assert_eq!(
        log(&gait).last(),
        Some(&Commit::One(
            ServoChannel::new(Leg::BackRight, Role::Lift),
            BODY_HEIGHT_DEFAULT
        ))
    );
}

#[test]
fn creep_backward_rotates_the_y_stance() {
    let world = World::facing(Direction::Backward);
    let mut gait = engine(&world);

    block_on(gait.creep(1)).unwrap();
    let poses = synchronized(&gait);

    assert_eq!(poses[0].pivot(Leg::BackRight), MAX_ANGLE - Y_POSITION_OPEN_ANGLE);
    assert_eq!(poses[0].pivot(Leg::FrontLeft), MAX_ANGLE - Y_POSITION_CLOSE_ANGLE);
    assert_eq!(lifted_legs(&poses[1]), [Leg::BackLeft]);
}

#[test]
fn no_commit_after_stop_is_observed() {
    let cases: [(GaitCommand, usize); 3] = [
        (GaitCommand::Trot(2), 4),
        (GaitCommand::Turn(3), 4),
        (GaitCommand::Creep(1), 8),
    ];
    for (cmd, total) in cases {
        for stop_at in 1..=total {
            let world = World::facing(Direction::Left).at(stop_at, Event::Stop);
            let mut gait = engine(&world);

            assert_eq!(block_on(gait.run(cmd)), Err(Cancelled), "{cmd:?} stop at {stop_at}");
            assert_eq!(log(&gait).len(), stop_at, "{cmd:?} stop at {stop_at}");
        }
    }
}

#[test]
fn cancelled_move_leaves_robot_where_it_stopped() {
    let world = World::new().at(2, Event::Stop);
    let mut gait = engine(&world);

    block_on(gait.trot(1)).unwrap_err();
    let poses = synchronized(&gait);
    // the second phase was halted before it got anywhere
    assert_eq!(gait.motion().current(), poses[0]);
}

#[test]
fn zero_cycles_runs_until_stopped() {
    let world = World::new().at(25, Event::Stop);
    let mut gait = engine(&world);

    assert_eq!(block_on(gait.run(GaitCommand::Trot(0))), Err(Cancelled));
    assert_eq!(log(&gait).len(), 25);
}

#[test]
fn pending_stop_prevents_any_commit() {
    let world = World::new();
    world.stop.set(true);
    let mut gait = engine(&world);

    assert_eq!(block_on(gait.creep(2)), Err(Cancelled));
    assert!(log(&gait).is_empty());
}

#[test]
fn center_and_twist() {
    let world = World::new();
    world.height.set(100);
    let mut gait = engine(&world);

    block_on(gait.run(GaitCommand::Center)).unwrap();
    block_on(gait.run(GaitCommand::Twist {
        angle: 20,
        left: true,
    }))
    .unwrap();

    let poses = synchronized(&gait);
    assert_eq!(poses[0], Pose::uniform(PIVOT_NEUTRAL).with_lifts(100));
    assert_eq!(poses[1], Pose::uniform(70).with_lifts(100));
}

#[test]
fn height_change_between_gaits_is_corrected_on_entry() {
    let world = World::new();
    let mut gait = engine(&world);

    block_on(gait.trot(1)).unwrap();
    world.height.set(60);
    block_on(gait.trot(1)).unwrap();

    let poses = synchronized(&gait);
    assert_eq!(poses.len(), 5);
    for leg in Leg::ALL {
        assert_eq!(poses[2].lift(leg), 60);
    }
}

extern crate alloc;

use crate::kinematics::motion::Actuator;
use crate::robot::{
    commands::ServoCommand,
    config::{
        NUMBER_OF_SERVOS, PIVOT_NEUTRAL, SERVO_PWM_FREQUENCY_HZ, SERVO_TICK_MS, STOP_POLL_MS,
    },
    joint::{Pose, ServoChannel},
    servo::{HaltRequest, MoveSequence, Servo, ServoBank},
};
use crate::SERVOCMD_CHANNEL_SIZE;
use alloc::boxed::Box;
use core::cell::Cell;
use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    channel::{Receiver, Sender},
    signal::Signal,
};
use embassy_time::{with_timeout, Duration, Ticker};
use embedded_hal::pwm::SetDutyCycle;
use esp_hal::gpio::AnyPin;
use esp_hal::ledc::channel::{self, Channel, ChannelIFace, Number};
use esp_hal::ledc::timer::{LSClockSource, TimerIFace};
use esp_hal::ledc::{timer, LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::peripherals::LEDC;
use esp_hal::time::Rate;
use fugit::HertzU32;
use log::{debug, info};

/// Sequence number of the last command the servo task finished or halted.
pub static MOVEMENT_COMPLETED: Signal<CriticalSectionRawMutex, u32> = Signal::new();
/// Sequence number of the command to halt.
pub static MOVEMENT_HALT: Signal<CriticalSectionRawMutex, u32> = Signal::new();
/// Angles the servos hold, refreshed every servo tick.
pub static SERVO_POSE: Mutex<CriticalSectionRawMutex, Cell<Pose>> =
    Mutex::new(Cell::new(Pose::uniform(PIVOT_NEUTRAL)));

/// Motion task side of the servo task: the [`Actuator`] the gait engine drives.
///
/// Every command is stamped with a sequence number. A completion only counts for the
/// command it names, so a halted command finishing late is never taken for the next one.
pub struct ServoLink {
    sender: Sender<'static, CriticalSectionRawMutex, ServoCommand, SERVOCMD_CHANNEL_SIZE>,
    sequence: MoveSequence,
    moving: bool,
}

impl ServoLink {
    pub fn new(
        sender: Sender<'static, CriticalSectionRawMutex, ServoCommand, SERVOCMD_CHANNEL_SIZE>,
    ) -> Self {
        Self {
            sender,
            sequence: MoveSequence::new(),
            moving: false,
        }
    }
}

impl Actuator for ServoLink {
    async fn start(&mut self, mut cmd: ServoCommand) {
        self.sequence.stamp(&mut cmd);
        self.sender.send(cmd).await;
        self.moving = true;
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    async fn wait(&mut self) {
        let poll = Duration::from_millis(STOP_POLL_MS);
        match with_timeout(poll, MOVEMENT_COMPLETED.wait()).await {
            Ok(seq) if self.sequence.is_current(seq) => self.moving = false,
            Ok(seq) => debug!("[MOTION_TASK] ignoring completion of command {}", seq),
            Err(_) => {}
        }
    }

    async fn halt(&mut self) {
        let seq = self.sequence.issued();
        MOVEMENT_HALT.signal(seq);
        // the servo task publishes its last pose before it acknowledges
        while !self.sequence.is_current(MOVEMENT_COMPLETED.wait().await) {}
        self.moving = false;
    }

    fn pose(&self) -> Pose {
        SERVO_POSE.lock(|pose| pose.get())
    }
}

fn create_configure_timer(ledc: &mut Ledc<'static>) -> timer::Timer<'static, LowSpeed> {
    let mut timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty14Bit,
            clock_source: LSClockSource::APBClk,
            frequency: Rate::from_hz(SERVO_PWM_FREQUENCY_HZ),
        })
        .expect("Fail creating ledc timer");
    timer
}

#[embassy_executor::task]
pub async fn servo_task(
    servo_pins: [AnyPin<'static>; NUMBER_OF_SERVOS],
    ledc: LEDC<'static>,
    receiver: Receiver<'static, CriticalSectionRawMutex, ServoCommand, SERVOCMD_CHANNEL_SIZE>,
) {
    info!("[SERVO_TASK] starting");
    let ledc: &'static mut Ledc<'static> = Box::leak(Box::new(Ledc::new(ledc)));
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

    //Configure timer: Leak it to get static lifetime.
    let timer: &'static timer::Timer<'static, LowSpeed> =
        Box::leak(Box::new(create_configure_timer(ledc)));
    let [p0, p1, p2, p3, p4, p5, p6, p7] = servo_pins;

    let channels: [Channel<'static, LowSpeed>; NUMBER_OF_SERVOS] = [
        ledc.channel(Number::Channel0, p0),
        ledc.channel(Number::Channel1, p1),
        ledc.channel(Number::Channel2, p2),
        ledc.channel(Number::Channel3, p3),
        ledc.channel(Number::Channel4, p4),
        ledc.channel(Number::Channel5, p5),
        ledc.channel(Number::Channel6, p6),
        ledc.channel(Number::Channel7, p7),
    ];

    let mut index = 0;
    let servos = channels.map(|mut channel| {
        channel
            .configure(channel::config::Config {
                timer,
                duty_pct: 7,
                pin_config: channel::config::PinConfig::PushPull,
            })
            .expect("Fail configurating servo channel");
        let servo = Servo::new(
            channel,
            HertzU32::from_raw(SERVO_PWM_FREQUENCY_HZ),
            ServoChannel::from_index(index),
        );
        index += 1;
        servo
    });

    let mut bank = ServoBank::new(servos);
    SERVO_POSE.lock(|pose| pose.set(bank.pose()));

    loop {
        let cmd = receiver.receive().await;
        debug!("[SERVO_TASK] Received command {}", cmd.seq);
        update_position(&mut bank, &cmd).await;
        MOVEMENT_COMPLETED.signal(cmd.seq);
    }
}

/// Play one command on the bank, one servo tick at a time, until it ends or is halted.
pub async fn update_position<PWM: SetDutyCycle>(bank: &mut ServoBank<PWM>, cmd: &ServoCommand) {
    let mut ticker = Ticker::every(Duration::from_millis(SERVO_TICK_MS as u64));
    bank.begin(cmd);

    loop {
        ticker.next().await;
        if let Some(seq) = MOVEMENT_HALT.try_take() {
            match bank.request_halt(seq) {
                HaltRequest::Halted => {
                    debug!("[SERVO_TASK] movement {} halted", seq);
                    break;
                }
                HaltRequest::Ahead => MOVEMENT_HALT.signal(seq),
                HaltRequest::Stale => {}
            }
        }

        let moving = bank.advance(SERVO_TICK_MS);
        SERVO_POSE.lock(|pose| pose.set(bank.pose()));
        if !moving {
            break;
        }
    }
}

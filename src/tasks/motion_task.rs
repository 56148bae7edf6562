//! High-level motion task.
//!
//! Receives gait commands, runs them on the gait engine and reports how they ended.
//!
//! Communicates with the servo task to execute planned movements.
use crate::kinematics::gait_engine::GaitEngine;
use crate::kinematics::motion::Cancelled;
use crate::robot::commands::{GaitCommand, ServoCommand};
use crate::robot::config::MotionConfig;
use crate::robot::state::CONTROL;
use crate::tasks::servo_task::ServoLink;
use crate::{SERVOCMD_CHANNEL_SIZE, TCPCMD_CHANNEL_SIZE};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Receiver, Sender},
};
use log::{debug, info};

#[embassy_executor::task]
pub async fn motion_task(
    gait_cmd_receiver: Receiver<'static, CriticalSectionRawMutex, GaitCommand, TCPCMD_CHANNEL_SIZE>,
    servo_cmd_sender: Sender<'static, CriticalSectionRawMutex, ServoCommand, SERVOCMD_CHANNEL_SIZE>,
) {
    let mut gait = GaitEngine::new(
        ServoLink::new(servo_cmd_sender),
        &CONTROL,
        MotionConfig::default(),
    );
    debug!("{:?}", gait.motion().config());

    loop {
        let cmd = gait_cmd_receiver.receive().await;
        info!("[MOTION_TASK] received {cmd:?}");

        CONTROL.clear_stop();
        CONTROL.set_busy(true);
        match gait.run(cmd).await {
            Ok(()) => debug!("[MOTION_TASK] {cmd:?} done"),
            Err(Cancelled) => info!("[MOTION_TASK] {cmd:?} stopped"),
        }
        CONTROL.set_busy(false);
    }
}

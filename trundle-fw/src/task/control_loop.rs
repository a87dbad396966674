//! Control loop task
//!
//! Owns the whole robot: drains the inbound command channel into the core's
//! queue, then runs one scheduler pass. The 2 ms tick comfortably oversamples
//! the fastest internal cadence (the 10 ms attitude update), so every
//! deadline is served close to on time.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Instant, Timer};
use trundle_core::{Command, ControlLoop};

use crate::board::RobotBoard;

const TICK_MS: u64 = 2;
const COMMAND_QUEUE_SIZE: usize = 8;

static COMMANDS: Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_SIZE> = Channel::new();

/// Hand a command to the robot; waits when the channel is momentarily full.
/// This is the seam the radio transport plugs into.
#[allow(dead_code)]
pub async fn send_command(cmd: Command) {
    COMMANDS.send(cmd).await;
}

/// Non-blocking variant for interrupt or callback contexts.
#[allow(dead_code)]
pub fn try_send_command(cmd: Command) -> bool {
    COMMANDS.try_send(cmd).is_ok()
}

#[embassy_executor::task]
pub async fn control_loop(board: RobotBoard) {
    let mut robot = ControlLoop::new(board, Instant::now());
    robot.boot(Instant::now());

    loop {
        while let Ok(cmd) = COMMANDS.try_receive() {
            robot.push_command(cmd);
        }
        robot.tick(Instant::now());
        Timer::after_millis(TICK_MS).await;
    }
}

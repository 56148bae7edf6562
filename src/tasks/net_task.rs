//! Networking and TCP command server task.
//!
//! Manages WiFi connection, listens for TCP commands and parses them. Direction, stop and
//! body-height commands take effect right away, also in the middle of a gait; gait
//! commands are forwarded to the motion task.
//!
//! Handles network errors and reconnection logic.
use crate::robot::commands::{GaitCommand, LineBuffer, TcpCommand};
use crate::robot::config::{PORT, RX_BUF_SIZE, TX_BUF_SIZE};
use crate::robot::state::CONTROL;
use crate::TCPCMD_CHANNEL_SIZE;
use embassy_net::{tcp::TcpSocket, IpListenEndpoint, Stack};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Sender};
use embassy_time::Timer;
use embedded_io_async::Write;
use esp_wifi::wifi::{ClientConfiguration, WifiController, WifiDevice};
use log::{error, info, warn};

type GaitSender = Sender<'static, CriticalSectionRawMutex, GaitCommand, TCPCMD_CHANNEL_SIZE>;

#[embassy_executor::task]
pub async fn runner_task(mut runner: embassy_net::Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

#[embassy_executor::task]
pub async fn net_task(stack: Stack<'static>, gait_sender: GaitSender) {
    let mut rx_buf = [0u8; RX_BUF_SIZE];
    let mut tx_buf = [0u8; TX_BUF_SIZE];

    while !stack.is_link_up() {
        Timer::after_millis(500).await;
    }
    stack.wait_config_up().await;

    if let Some(config) = stack.config_v4() {
        info!(
            "[NET_TASK] TCP server listening at address {}:{}",
            config.address, PORT
        );
    }

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);

        match socket
            .accept(IpListenEndpoint {
                port: PORT,
                addr: None,
            })
            .await
        {
            Ok(_) => {
                info!("[NET_TASK] Client connected!");
                handle_connection(&mut socket, &gait_sender).await;
                socket.close();
            }
            Err(e) => {
                error!("[NET_TASK] Accept failed: {:?}", e);
                Timer::after_millis(500).await; // Backoff delay
                continue;
            }
        }
    }
}

pub async fn handle_connection(socket: &mut TcpSocket<'_>, gait_sender: &GaitSender) {
    let mut rx_buf = [0u8; RX_BUF_SIZE];
    let mut lines: LineBuffer<RX_BUF_SIZE> = LineBuffer::new();
    loop {
        let n = match socket.read(&mut rx_buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                error!("[NET_TASK] Read error: {:?}", e);
                break;
            }
        };

        for &byte in &rx_buf[..n] {
            let Some(line) = lines.push(byte) else {
                continue;
            };
            let reply: &[u8] = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => match TcpCommand::try_from(line) {
                    Ok(TcpCommand::CloseConnection) => return,
                    Ok(cmd) => {
                        dispatch(cmd, gait_sender).await;
                        b"ok\n"
                    }
                    Err(_) => {
                        warn!("[NET_TASK] Unrecognised command: {}", line);
                        b"?\n"
                    }
                },
                Err(e) => {
                    warn!("[NET_TASK] Dropped line: {:?}", e);
                    b"?\n"
                }
            };
            if let Err(e) = socket.write_all(reply).await {
                error!("[NET_TASK] Write error: {:?}", e);
                return;
            }
        }
    }
}

/// Apply a command to the shared control state or hand it to the motion task.
pub async fn dispatch(cmd: TcpCommand, gait_sender: &GaitSender) {
    match cmd {
        TcpCommand::Direction(direction) => {
            info!("[NET_TASK] direction {}", direction);
            CONTROL.set_direction(direction);
        }
        TcpCommand::Stop => {
            info!("[NET_TASK] stop");
            CONTROL.request_stop();
        }
        TcpCommand::BodyUp => {
            let height = CONTROL.adjust_body_height(1);
            info!("[NET_TASK] body height {}", height);
        }
        TcpCommand::BodyDown => {
            let height = CONTROL.adjust_body_height(-1);
            info!("[NET_TASK] body height {}", height);
        }
        TcpCommand::Gait(gait) => start_gait(gait, gait_sender).await,
        TcpCommand::DirectedGait(direction, gait) => {
            CONTROL.set_direction(direction);
            start_gait(gait, gait_sender).await;
        }
        TcpCommand::CloseConnection => {}
    }
}

/// A new gait replaces the running one: stop it, it unwinds at its next phase boundary.
async fn start_gait(gait: GaitCommand, gait_sender: &GaitSender) {
    if CONTROL.is_busy() {
        CONTROL.request_stop();
    }
    gait_sender.send(gait).await;
}

pub async fn configurate_and_start_wifi(wifi_controller: &mut WifiController<'_>) {
    let ssid = env!("WIFI_SSID");
    let password = env!("WIFI_PASS");
    let config = esp_wifi::wifi::Configuration::Client(ClientConfiguration {
        ssid: ssid.into(),
        password: password.into(),
        ..Default::default()
    });

    info!("[NET_TASK] Connecting to wifi: {ssid}");
    wifi_controller
        .set_configuration(&config)
        .expect("fail setting configuration of wifi controller");

    wifi_controller
        .set_power_saving(esp_wifi::config::PowerSaveMode::None)
        .expect("Fail setting wifi power mode");

    wifi_controller
        .start()
        .expect("Fail starting wifi controller");
    wifi_controller
        .connect_async()
        .await
        .inspect_err(|e| error!("An error occured trying to connect to wifi: {e:?}"))
        .expect("Fail connecting to wifi");

    if let Ok(rssi) = wifi_controller.rssi() {
        info!("[NET_TASK] Wifi connected! signal: {}", rssi)
    }
}

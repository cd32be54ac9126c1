mod support;

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use rollcore::codec::{v1, v2};
use rollcore::control::drive::DriveController;
use rollcore::control::sensor_v1::SensorBitmaskController;
use rollcore::packet::RawCommand;
use rollcore::toy::sphero_classic;
use rollcore::transactor::{Transactor, WireVariant};
use rollcore::Error;
use support::MockTransport;

async fn respond_to_next(transport: Arc<MockTransport>, did: u8, cid: u8, err: v2::ErrorCode, data: Vec<u8>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if let Some(last) = transport.last_sent().await {
                if let Ok(req) = v2::Packet::parse(&last) {
                    if req.device_id == did && req.command_id == cid {
                        let resp = v2::Packet::response(&req, err, data.clone());
                        transport.feed(resp.build()).await;
                        break;
                    }
                }
            }
        }
    });
}

#[tokio::test]
async fn execute_resolves_and_commands_serialize_in_order() {
    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();

    respond_to_next(transport.clone(), 24, 0, v2::ErrorCode::Success, vec![]).await;
    let first = tx.execute(RawCommand::new(24, 0, None, vec![1])).await.unwrap();
    assert!(first.is_response());

    respond_to_next(transport.clone(), 24, 1, v2::ErrorCode::Success, vec![]).await;
    let second = tx.execute(RawCommand::new(24, 1, None, vec![2])).await.unwrap();
    assert!(second.is_response());

    // Both commands were written in issue order (seq 0 then seq 1).
    let sent = transport.sent.lock().await.clone();
    let first_req = v2::Packet::parse(&sent[0]).unwrap();
    let second_req = v2::Packet::parse(&sent[1]).unwrap();
    assert_eq!(first_req.seq, 0);
    assert_eq!(second_req.seq, 1);
}

#[tokio::test]
async fn timeout_removes_waiter_and_later_ping_still_succeeds() {
    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();

    let timed_out = tx.execute_with_timeout(RawCommand::new(16, 0, None, vec![]), Duration::from_millis(30)).await;
    assert!(matches!(timed_out, Err(Error::Timeout)));

    respond_to_next(transport.clone(), 16, 0, v2::ErrorCode::Success, vec![0xAA]).await;
    let result = tx.execute_with_timeout(RawCommand::new(16, 0, None, vec![]), Duration::from_secs(2)).await.unwrap();
    assert_eq!(result.data(), &[0xAA]);
}

#[tokio::test]
async fn command_error_surfaces_as_command_execute() {
    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();

    respond_to_next(transport.clone(), 24, 0, v2::ErrorCode::Busy, vec![]).await;
    let result = tx.execute(RawCommand::new(24, 0, None, vec![])).await;
    assert!(matches!(result, Err(Error::CommandExecute(_))));
}

#[tokio::test]
async fn roll_backward_then_stop_matches_scenario() {
    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();
    let drive = DriveController::new(tx.clone(), WireVariant::V2, &rollcore::toy::mini::CAPABILITIES, None);

    respond_to_next(transport.clone(), 22, 7, v2::ErrorCode::Success, vec![]).await;
    drive.roll_start(30, -100).await.unwrap();
    let sent = transport.last_sent().await.unwrap();
    let req = v2::Packet::parse(&sent).unwrap();
    assert_eq!(req.data, vec![100, 0x00, 210, 0b01]);

    respond_to_next(transport.clone(), 22, 7, v2::ErrorCode::Success, vec![]).await;
    drive.roll_stop(30).await.unwrap();
    let sent = transport.last_sent().await.unwrap();
    let req = v2::Packet::parse(&sent).unwrap();
    assert_eq!(req.data, vec![0, 0x00, 30, 0b00]);
}

#[tokio::test]
async fn drive_rejects_a_command_the_model_does_not_implement() {
    use rollcore::toy::types::{LedMaskWidth, SensorGroup, StreamingProtocol, ToyCapabilities, ToyTypeInfo};

    const NO_SENSORS: &[SensorGroup] = &[];
    static NO_DRIVE: ToyCapabilities = ToyCapabilities {
        toy_type: ToyTypeInfo { display_name: "Bare", prefix: None, filter_prefix: "BR" },
        wire: WireVariant::V2,
        cmd_safe_interval: Duration::from_millis(120),
        processor_count: 1,
        streaming_protocol: StreamingProtocol::Bitmask,
        led_mask_width: LedMaskWidth::None,
        led_count: 0,
        sensors: NO_SENSORS,
        extended_sensors: NO_SENSORS,
        streaming_services: &[],
        supported: &[],
    };

    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V2, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();
    let drive = DriveController::new(tx, WireVariant::V2, &NO_DRIVE, None);

    let result = drive.roll_start(30, -100).await;
    assert!(matches!(result, Err(Error::UnsupportedOperation { did: 22, cid: 7 })));
    // Never reached the wire: only the handshake write went out.
    assert_eq!(transport.sent.lock().await.len(), 1);
}

#[tokio::test]
async fn v1_sensor_enable_then_notification_reaches_subscriber() {
    let transport = MockTransport::new();
    let tx = Transactor::new(WireVariant::V1, transport.clone(), Duration::from_millis(1));
    tx.open().await.unwrap();
    let sensors = SensorBitmaskController::new(tx.clone(), WireVariant::V1, &sphero_classic::CAPABILITIES, None);

    let samples: Arc<StdMutex<Vec<_>>> = Arc::new(StdMutex::new(Vec::new()));
    let samples_clone = samples.clone();
    sensors.on_data(move |sample| samples_clone.lock().unwrap().push(sample)).await;

    sensors.enable("accelerometer", true).await;

    // `commit()` is this transactor's first command, so it carries seq 0 —
    // feed the matching success response directly rather than re-parsing
    // the request we just wrote (our own outbound bytes aren't structurally
    // distinguishable from a response frame once re-collected).
    let responder = tokio::spawn({
        let transport = transport.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let response = v1::Response { mrsp: v1::MrspError::CommandSucceeded, seq: 0, data: vec![] };
            transport.feed(response.build()).await;
        }
    });
    sensors.commit().await.unwrap();
    responder.await.unwrap();

    // Accelerometer x/y/z words at the scenario's extremes.
    let notify = v1::Async { id_code: 3, data: vec![0x7F, 0xFF, 0x80, 0x00, 0x00, 0x00] };
    transport.feed(notify.build()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let samples = samples.lock().unwrap();
    assert_eq!(samples.len(), 1);
    let (group, values) = &samples[0][0];
    assert_eq!(*group, "accelerometer");
    assert_eq!(values[0], ("x", 32767.0 / 4096.0));
    assert_eq!(values[1], ("y", -32768.0 / 4096.0));
}

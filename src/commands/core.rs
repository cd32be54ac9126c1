//! Device id 0 — bookkeeping commands common to every v1-era toy.

use crate::error::Error;
use crate::packet::{ListenerKey, Processor, RawCommand};

pub const DID: u8 = 0;

/// v1 async notifications key on a reserved `id_code`, not `(did, cid)` —
/// there is no v2-style notifier opcode for these (`Async` in
/// `spherov2/commands/async_.py`).
pub const BATTERY_STATE_CHANGED_NOTIFY_V1: ListenerKey = ListenerKey::V1(1);
pub const WILL_SLEEP_NOTIFY_V1: ListenerKey = ListenerKey::V1(5);
pub const DID_SLEEP_NOTIFY_V1: ListenerKey = ListenerKey::V1(20);

pub fn ping(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 1, target, vec![])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub record_version: u8,
    pub model_number: u8,
    pub hardware_version_code: u8,
    pub main_app_version_major: u8,
    pub main_app_version_minor: u8,
    pub bootloader_version: String,
    pub orb_basic_version: String,
    pub overlay_version: String,
}

pub fn get_versions(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 2, target, vec![])
}

pub fn decode_versions(data: &[u8]) -> Result<Versions, Error> {
    if data.len() < 8 {
        return Err(Error::Decode("core: get_versions response too short".into()));
    }
    let nibble_version = |b: u8| format!("{}.{}", b >> 4, b & 0xf);
    Ok(Versions {
        record_version: data[0],
        model_number: data[1],
        hardware_version_code: data[2],
        main_app_version_major: data[3],
        main_app_version_minor: data[4],
        bootloader_version: nibble_version(data[5]),
        orb_basic_version: nibble_version(data[6]),
        overlay_version: nibble_version(data[7]),
    })
}

pub fn set_bluetooth_name(name: &str, target: Option<Processor>) -> RawCommand {
    let mut data = name.as_bytes().to_vec();
    data.push(0);
    RawCommand::new(DID, 16, target, data)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothInfo {
    pub name: String,
    pub address: String,
}

pub fn get_bluetooth_info(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 17, target, vec![])
}

pub fn decode_bluetooth_info(data: &[u8]) -> Result<BluetoothInfo, Error> {
    let mut parts = data.splitn(3, |&b| b == 0);
    let name = parts
        .next()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .ok_or_else(|| Error::Decode("core: missing bluetooth name".into()))?;
    let address = parts
        .next()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .ok_or_else(|| Error::Decode("core: missing bluetooth address".into()))?;
    Ok(BluetoothInfo { name, address })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerState {
    pub record_version: u8,
    pub state: u8,
    pub voltage: f32,
    pub number_of_charges: u16,
    pub time_since_last_charge: u16,
}

pub fn get_power_state(target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 32, target, vec![])
}

pub fn decode_power_state(data: &[u8]) -> Result<PowerState, Error> {
    if data.len() < 8 {
        return Err(Error::Decode("core: get_power_state response too short".into()));
    }
    let voltage = u16::from_be_bytes([data[2], data[3]]) as f32 / 100.0;
    Ok(PowerState {
        record_version: data[0],
        state: data[1],
        voltage,
        number_of_charges: u16::from_be_bytes([data[4], data[5]]),
        time_since_last_charge: u16::from_be_bytes([data[6], data[7]]),
    })
}

pub fn enable_battery_state_changed_notify(enable: bool, target: Option<Processor>) -> RawCommand {
    RawCommand::new(DID, 33, target, vec![enable as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_versions() {
        let v = decode_versions(&[1, 2, 3, 4, 5, 0x12, 0x34, 0x56]).unwrap();
        assert_eq!(v.bootloader_version, "1.2");
        assert_eq!(v.orb_basic_version, "3.4");
        assert_eq!(v.overlay_version, "5.6");
    }

    #[test]
    fn decodes_bluetooth_info() {
        let mut data = b"Sphero-ABC".to_vec();
        data.push(0);
        data.extend_from_slice(b"11:22:33:44:55:66");
        data.push(0);
        let info = decode_bluetooth_info(&data).unwrap();
        assert_eq!(info.name, "Sphero-ABC");
        assert_eq!(info.address, "11:22:33:44:55:66");
    }

    #[test]
    fn decodes_power_state() {
        let data = [1, 3, 0x0F, 0xA0, 0x00, 0x02, 0x00, 0x10];
        let ps = decode_power_state(&data).unwrap();
        assert_eq!(ps.voltage, 40.0);
        assert_eq!(ps.number_of_charges, 2);
        assert_eq!(ps.time_since_last_charge, 16);
    }
}

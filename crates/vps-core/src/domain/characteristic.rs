//! Characteristic catalogue.
//!
//! Every characteristic the bridge exposes is one variant of
//! [`CharacteristicKind`].  The UUID and the capability set of each kind are
//! fixed at compile time, so the dispatch engine never has to test a handler
//! to discover what it supports.
//!
//! # Capabilities (for beginners)
//!
//! A GATT characteristic advertises which operations a remote controller may
//! perform on it:
//!
//! - **Read** – the controller asks for the current value.
//! - **Write** – the controller sends bytes that trigger a side effect.
//! - **Notify** – the controller subscribes and receives pushed values.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Suffix shared by the service and every characteristic UUID.
const UUID_SUFFIX: u128 = 0x0000_0000_710e_4a5b_8d75_3e5b444bc3cf;

const fn vps_uuid(prefix: u32) -> Uuid {
    Uuid::from_u128(((prefix as u128) << 96) | UUID_SUFFIX)
}

/// UUID of the primary VPS service.
pub const SERVICE_UUID: Uuid = vps_uuid(0x0000_1000);

/// One operation a characteristic may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    Write,
    Notify,
}

impl Capability {
    /// The BlueZ flag string for this capability.
    pub fn flag(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Notify => "notify",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Capability::Read => 0b001,
            Capability::Write => 0b010,
            Capability::Notify => 0b100,
        }
    }
}

/// A set of [`Capability`] values stored as a bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READ: Capabilities = Capabilities(0b001);
    pub const WRITE: Capabilities = Capabilities(0b010);
    pub const NOTIFY: Capabilities = Capabilities(0b100);

    /// Returns the union of two capability sets.
    pub const fn with(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// Returns `true` if `capability` is part of this set.
    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Returns the BlueZ flag strings in read, write, notify order.
    pub fn flags(self) -> Vec<&'static str> {
        [Capability::Read, Capability::Write, Capability::Notify]
            .into_iter()
            .filter(|c| self.contains(*c))
            .map(Capability::flag)
            .collect()
    }
}

/// The closed set of characteristics exposed by the VPS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    /// Write `"<ssid>,<password>"` to join a Wi-Fi network.
    WifiConnect,
    /// Read the SSID of the active Wi-Fi connection.
    CurrentSsid,
    /// Read the host's IP address.
    Ip,
    /// Read the host name.
    LocalName,
    /// Diagnostic command channel: write a command line, read or receive its output.
    Terminal,
    /// Write a command code that drives the recorder service.
    RemoteControl,
    /// Read or subscribe to `"<battery>,Ready"`.
    DeviceStatus,
}

impl CharacteristicKind {
    /// Every kind, in service registration order.
    pub const ALL: [CharacteristicKind; 7] = [
        CharacteristicKind::WifiConnect,
        CharacteristicKind::CurrentSsid,
        CharacteristicKind::Ip,
        CharacteristicKind::LocalName,
        CharacteristicKind::Terminal,
        CharacteristicKind::RemoteControl,
        CharacteristicKind::DeviceStatus,
    ];

    /// The GATT UUID of this characteristic.
    pub const fn uuid(self) -> Uuid {
        match self {
            CharacteristicKind::CurrentSsid => vps_uuid(0x0000_2001),
            CharacteristicKind::Ip => vps_uuid(0x0000_2002),
            CharacteristicKind::WifiConnect => vps_uuid(0x0000_2003),
            CharacteristicKind::Terminal => vps_uuid(0x0000_2004),
            CharacteristicKind::LocalName => vps_uuid(0x0000_2005),
            CharacteristicKind::RemoteControl => vps_uuid(0x0000_2006),
            CharacteristicKind::DeviceStatus => vps_uuid(0x0000_2007),
        }
    }

    /// The operations this characteristic advertises.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            CharacteristicKind::WifiConnect | CharacteristicKind::RemoteControl => {
                Capabilities::WRITE
            }
            CharacteristicKind::CurrentSsid
            | CharacteristicKind::Ip
            | CharacteristicKind::LocalName => Capabilities::READ,
            CharacteristicKind::Terminal => Capabilities::READ
                .with(Capabilities::WRITE)
                .with(Capabilities::NOTIFY),
            CharacteristicKind::DeviceStatus => Capabilities::READ.with(Capabilities::NOTIFY),
        }
    }

    /// Looks up a kind by its UUID.
    pub fn from_uuid(uuid: Uuid) -> Option<CharacteristicKind> {
        Self::ALL.into_iter().find(|k| k.uuid() == uuid)
    }

    /// Short kebab-case name used in logs and by the console transport.
    pub fn slug(self) -> &'static str {
        match self {
            CharacteristicKind::WifiConnect => "wifi-connect",
            CharacteristicKind::CurrentSsid => "current-ssid",
            CharacteristicKind::Ip => "ip",
            CharacteristicKind::LocalName => "local-name",
            CharacteristicKind::Terminal => "terminal",
            CharacteristicKind::RemoteControl => "remote-control",
            CharacteristicKind::DeviceStatus => "device-status",
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for CharacteristicKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.slug() == s).ok_or(())
    }
}

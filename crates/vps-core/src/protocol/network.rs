//! Parsing of NetworkManager output.

/// Value served by CurrentSSID when no Wi-Fi connection is active.
pub const NOT_CONNECTED: &str = "Not connected";

/// Returns the name of the first active connection whose line mentions
/// `wifi` in the output of `nmcli connection show --active`.
///
/// ```text
/// NAME       UUID                                  TYPE      DEVICE
/// LabNet     5d3c1d4e-2b8e-4a4a-9d64-7f3b1c7d2a10  wifi      wlan0
/// lo         0f5c4d5e-1111-2222-3333-444455556666  loopback  lo
/// ```
///
/// Names containing spaces are truncated at the first space, matching what
/// the controller has always received.
pub fn parse_active_ssid(nmcli_output: &str) -> Option<String> {
    nmcli_output
        .lines()
        .filter(|line| line.contains("wifi"))
        .find_map(|line| line.split_whitespace().next())
        .map(str::to_string)
}

//! Parser for lsof field output (`-F cPnpLT`).
//!
//! The input is a sequence of process sets, each followed by its file sets:
//!
//! ```text
//! p1234          process set: PID
//! cnginx         command name
//! Lwww-data      login name
//! f6             file set: descriptor
//! PTCP           protocol
//! n*:80          local[:port][->remote:port]
//! TST=LISTEN     TCP state (other T sub-tags are ignored)
//! ```
//!
//! Process sets are split on `\np`, file sets on `\nf`. Filters from
//! [`FilterConfig`] are applied during the same pass, so a returned
//! [`Process`] only ever holds connections that passed every filter and is
//! never empty.

use crate::collect::PortSource;
use pvw_common::{Connection, FilterConfig, ParseError, Process, STATUS_CLOSED};
use tracing::{debug, trace};

const PROCESS_SEPARATOR: &str = "\np";
const CONNECTION_SEPARATOR: &str = "\nf";
const ADDRESS_ARROW: &str = "->";

/// `n` value marking a socket with neither side bound.
pub const WILDCARD_ADDRESS: &str = "*:*";

/// Parse raw enumeration text into filtered process records.
///
/// `source` is only consulted when working-directory resolution is enabled.
///
/// # Errors
/// * [`ParseError::InvalidPid`] if any process set has a malformed PID; the
///   whole parse fails, not just that process
/// * [`ParseError::WorkingDirectory`] if a working-directory lookup fails
pub fn parse(
    raw: &str,
    filter: &FilterConfig,
    source: &dyn PortSource,
) -> Result<Vec<Process>, ParseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut processes = Vec::new();
    for (index, block) in raw.split(PROCESS_SEPARATOR).enumerate() {
        // Only the first set lacks a preceding newline, so it keeps its tag.
        let block = if index == 0 {
            block.strip_prefix('p').unwrap_or(block)
        } else {
            block
        };
        if let Some(process) = parse_process(index, block, filter, source)? {
            processes.push(process);
        }
    }

    debug!(
        processes = processes.len(),
        connections = processes.iter().map(|p| p.connections.len()).sum::<usize>(),
        "parsed lsof output"
    );
    Ok(processes)
}

fn parse_process(
    index: usize,
    block: &str,
    filter: &FilterConfig,
    source: &dyn PortSource,
) -> Result<Option<Process>, ParseError> {
    let mut segments = block.split(CONNECTION_SEPARATOR);
    let header = segments.next().unwrap_or_default();
    let mut header_lines = header.lines();

    let pid_line = header_lines.next().unwrap_or_default();
    let id = parse_pid(pid_line).ok_or_else(|| ParseError::InvalidPid {
        block: index,
        value: pid_line.to_string(),
    })?;

    let mut name = String::new();
    let mut owner = String::new();
    for line in header_lines {
        if let Some(value) = line.strip_prefix('c') {
            name = value.to_string();
        } else if let Some(value) = line.strip_prefix('L') {
            owner = value.to_string();
        }
    }

    if !filter.admits_name(&name) {
        trace!(pid = id, name = %name, "process skipped by name filter");
        return Ok(None);
    }

    let working_directory = if filter.resolve_working_directory {
        let dir = source
            .resolve_working_directory(id)
            .map_err(|source| ParseError::WorkingDirectory { pid: id, source })?;
        Some(dir)
    } else {
        None
    };

    let connections: Vec<Connection> = segments
        .filter_map(|segment| parse_connection(segment, filter))
        .collect();

    if connections.is_empty() {
        trace!(pid = id, name = %name, "process dropped: no connections left");
        return Ok(None);
    }

    Ok(Some(Process {
        id,
        name,
        owner,
        working_directory,
        connections,
    }))
}

/// Strictly positive decimal PID.
fn parse_pid(line: &str) -> Option<u32> {
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse::<u32>().ok().filter(|&pid| pid > 0)
}

/// Parse one file set. Returns `None` if any filter rule rejects it.
fn parse_connection(segment: &str, filter: &FilterConfig) -> Option<Connection> {
    let mut conn = Connection::default();
    let mut valid = true;

    // The first line is the remainder of the `f` (descriptor) field.
    for line in segment.lines().skip(1) {
        let Some(tag) = line.chars().next() else {
            continue;
        };
        let value = &line[tag.len_utf8()..];

        match tag {
            'P' => conn.protocol = value.to_string(),
            'n' => {
                if value == WILDCARD_ADDRESS {
                    valid = false;
                    continue;
                }
                parse_address(value, &mut conn);
                if !filter.admits_ports(&conn.local_port, &conn.remote_port) {
                    valid = false;
                }
            }
            'T' => {
                let Some(state) = value.strip_prefix("ST=") else {
                    continue;
                };
                conn.status = state.to_string();
                if !filter.show_closed && state == STATUS_CLOSED {
                    valid = false;
                }
                if filter.listen_only && !conn.is_listening() {
                    valid = false;
                }
            }
            _ => {}
        }
    }

    valid.then_some(conn)
}

/// Fill address fields from `local[:port][->remote[:port]]`.
fn parse_address(value: &str, conn: &mut Connection) {
    let (local, remote) = match value.split_once(ADDRESS_ARROW) {
        Some((local, remote)) => (local, Some(remote)),
        None => (value, None),
    };

    (conn.local_address, conn.local_port) = split_host_port(local);
    if let Some(remote) = remote {
        (conn.remote_address, conn.remote_port) = split_host_port(remote);
    }
}

/// Split on the last `:` so bracketed IPv6 hosts keep their colons.
fn split_host_port(side: &str) -> (String, String) {
    match side.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.to_string()),
        None => (side.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvw_common::CollectionError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source recording which PIDs had their directory looked up.
    #[derive(Default)]
    struct FakeSource {
        dirs: HashMap<u32, String>,
        fail: bool,
        lookups: Mutex<Vec<u32>>,
    }

    impl PortSource for FakeSource {
        fn collect(&self) -> Result<String, CollectionError> {
            Ok(String::new())
        }

        fn resolve_working_directory(&self, pid: u32) -> Result<String, CollectionError> {
            self.lookups.lock().unwrap().push(pid);
            if self.fail {
                return Err(CollectionError::NonZeroExit {
                    command: "lsof".to_string(),
                    code: 2,
                    stderr: String::new(),
                });
            }
            Ok(self.dirs.get(&pid).cloned().unwrap_or_default())
        }
    }

    const SSH_SAMPLE: &str =
        "p123\ncbash\nLally\nftcp\nPTCP\nn127.0.0.1:22->10.0.0.5:5555\nTST=ESTABLISHED";

    const MULTI_SAMPLE: &str = "p101\ncnginx\nLwww\nf6\nPTCP\nn*:80\nTST=LISTEN\nTQR=0\nTQS=0\n\
f7\nPTCP\nn[::]:80\nTST=LISTEN\n\
p202\ncchrome\nLally\nf31\nPUDP\nn*:5353\n\
f40\nPTCP\nn192.168.1.4:50514->142.250.1.1:443\nTST=ESTABLISHED\n\
f41\nPTCP\nn192.168.1.4:50600->142.250.1.1:443\nTST=CLOSED\n\
p303\ncrapportd\nLroot\nf3\nPUDP\nn*:*\n";

    fn parse_plain(raw: &str, filter: &FilterConfig) -> Result<Vec<Process>, ParseError> {
        parse(raw, filter, &FakeSource::default())
    }

    #[test]
    fn parses_single_connection_example() {
        let procs = parse_plain(SSH_SAMPLE, &FilterConfig::default()).unwrap();
        assert_eq!(procs.len(), 1);
        let p = &procs[0];
        assert_eq!(p.id, 123);
        assert_eq!(p.name, "bash");
        assert_eq!(p.owner, "ally");
        assert_eq!(p.working_directory, None);
        assert_eq!(
            p.connections,
            vec![Connection {
                protocol: "TCP".to_string(),
                status: "ESTABLISHED".to_string(),
                local_address: "127.0.0.1".to_string(),
                local_port: "22".to_string(),
                remote_address: "10.0.0.5".to_string(),
                remote_port: "5555".to_string(),
            }]
        );
    }

    #[test]
    fn listen_only_rejects_established() {
        let filter = FilterConfig {
            listen_only: true,
            ..Default::default()
        };
        assert!(parse_plain(SSH_SAMPLE, &filter).unwrap().is_empty());
    }

    #[test]
    fn listen_only_keeps_listeners() {
        let raw = "p5\ncnginx\nLwww\nf6\nPTCP\nn*:80\nTST=LISTEN\n\
f7\nPTCP\nn10.0.0.1:80->10.0.0.9:51000\nTST=ESTABLISHED\n";
        let filter = FilterConfig {
            listen_only: true,
            ..Default::default()
        };
        let procs = parse_plain(raw, &filter).unwrap();
        assert_eq!(procs.len(), 1);
        assert_eq!(procs[0].connections.len(), 1);
        assert!(procs[0].connections[0].is_listening());
        assert_eq!(procs[0].connections[0].local_port, "80");
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        let filter = FilterConfig::default();
        assert!(parse_plain("", &filter).unwrap().is_empty());
        assert!(parse_plain("\n  \n", &filter).unwrap().is_empty());
    }

    #[test]
    fn wildcard_address_is_dropped_without_filters() {
        let raw = "p9\ncmDNSResponder\nL_mdns\nf3\nPUDP\nn*:*\n";
        assert!(parse_plain(raw, &FilterConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn multi_process_sample() {
        let procs = parse_plain(MULTI_SAMPLE, &FilterConfig::default()).unwrap();
        let ids: Vec<u32> = procs.iter().map(|p| p.id).collect();
        // rapportd only had a wildcard socket, so it disappears.
        assert_eq!(ids, vec![101, 202]);

        let nginx = &procs[0];
        assert_eq!(nginx.connections.len(), 2);
        assert_eq!(nginx.connections[0].local_address, "*");
        assert_eq!(nginx.connections[0].local_port, "80");
        assert_eq!(nginx.connections[0].status, "LISTEN");
        assert_eq!(nginx.connections[1].local_address, "[::]");
        assert_eq!(nginx.connections[1].local_port, "80");

        // The CLOSED socket is hidden by default.
        let chrome = &procs[1];
        assert_eq!(chrome.connections.len(), 2);
        assert_eq!(chrome.connections[0].protocol, "UDP");
        assert_eq!(chrome.connections[0].status, "");
        assert_eq!(chrome.connections[1].remote_port, "443");
    }

    #[test]
    fn show_closed_keeps_closed_sockets() {
        let filter = FilterConfig {
            show_closed: true,
            ..Default::default()
        };
        let procs = parse_plain(MULTI_SAMPLE, &filter).unwrap();
        let chrome = procs.iter().find(|p| p.id == 202).unwrap();
        assert_eq!(chrome.connections.len(), 3);
        assert_eq!(chrome.connections[2].status, "CLOSED");
    }

    #[test]
    fn show_closed_and_listen_only_both_apply() {
        let filter = FilterConfig {
            show_closed: true,
            listen_only: true,
            ..Default::default()
        };
        let procs = parse_plain(MULTI_SAMPLE, &filter).unwrap();
        for p in &procs {
            for c in &p.connections {
                assert_ne!(c.status, "CLOSED");
                assert_ne!(c.status, "ESTABLISHED");
            }
        }
    }

    #[test]
    fn listen_only_does_not_judge_stateless_sockets() {
        let filter = FilterConfig {
            listen_only: true,
            ..Default::default()
        };
        let procs = parse_plain(MULTI_SAMPLE, &filter).unwrap();
        let chrome = procs.iter().find(|p| p.id == 202).unwrap();
        assert_eq!(chrome.connections.len(), 1);
        assert_eq!(chrome.connections[0].protocol, "UDP");
    }

    #[test]
    fn port_filter_matches_local_or_remote() {
        let filter = FilterConfig {
            ports: vec!["443".to_string()],
            ..Default::default()
        };
        let procs = parse_plain(MULTI_SAMPLE, &filter).unwrap();
        assert_eq!(procs.len(), 1);
        assert_eq!(procs[0].id, 202);
        assert!(procs[0]
            .connections
            .iter()
            .all(|c| c.local_port == "443" || c.remote_port == "443"));

        let filter = FilterConfig {
            ports: vec!["22".to_string()],
            ..Default::default()
        };
        assert_eq!(parse_plain(SSH_SAMPLE, &filter).unwrap().len(), 1);
        let filter = FilterConfig {
            ports: vec!["5555".to_string()],
            ..Default::default()
        };
        assert_eq!(parse_plain(SSH_SAMPLE, &filter).unwrap().len(), 1);
    }

    #[test]
    fn name_filter_short_circuits_before_lookup() {
        let source = FakeSource::default();
        let filter = FilterConfig {
            names: vec!["nginx".to_string()],
            resolve_working_directory: true,
            ..Default::default()
        };
        let procs = parse(MULTI_SAMPLE, &filter, &source).unwrap();
        assert_eq!(procs.len(), 1);
        assert_eq!(procs[0].name, "nginx");
        assert_eq!(*source.lookups.lock().unwrap(), vec![101]);
    }

    #[test]
    fn working_directory_is_resolved_when_enabled() {
        let mut source = FakeSource::default();
        source.dirs.insert(123, "/home/ally".to_string());
        let filter = FilterConfig {
            resolve_working_directory: true,
            ..Default::default()
        };
        let procs = parse(SSH_SAMPLE, &filter, &source).unwrap();
        assert_eq!(procs[0].working_directory.as_deref(), Some("/home/ally"));
    }

    #[test]
    fn working_directory_failure_fails_the_parse() {
        let source = FakeSource {
            fail: true,
            ..Default::default()
        };
        let filter = FilterConfig {
            resolve_working_directory: true,
            ..Default::default()
        };
        let err = parse(SSH_SAMPLE, &filter, &source).unwrap_err();
        assert!(matches!(err, ParseError::WorkingDirectory { pid: 123, .. }));
    }

    #[test]
    fn bad_pid_is_fatal_for_the_whole_parse() {
        let raw = format!("{}\npabc\ncfoo\nLbar\nf1\nPTCP\nn*:1\n", SSH_SAMPLE);
        let err = parse_plain(&raw, &FilterConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidPid {
                block: 1,
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn zero_and_signed_pids_are_rejected() {
        for raw in ["p0\ncx\nLy\n", "p+5\ncx\nLy\n", "p\ncx\n"] {
            assert!(
                parse_plain(raw, &FilterConfig::default()).is_err(),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn local_only_address_leaves_remote_empty() {
        let raw = "p5\ncredis-server\nLredis\nf6\nPTCP\nn127.0.0.1:6379\nTST=LISTEN\n";
        let procs = parse_plain(raw, &FilterConfig::default()).unwrap();
        let c = &procs[0].connections[0];
        assert_eq!(c.local_address, "127.0.0.1");
        assert_eq!(c.local_port, "6379");
        assert_eq!(c.remote_address, "");
        assert_eq!(c.remote_port, "");
    }

    #[test]
    fn ipv6_peer_addresses_keep_colons() {
        let raw = "p5\ncssh\nLally\nf3\nPTCP\nn[fe80::1]:51000->[2001:db8::2]:22\nTST=ESTABLISHED\n";
        let procs = parse_plain(raw, &FilterConfig::default()).unwrap();
        let c = &procs[0].connections[0];
        assert_eq!(c.local_address, "[fe80::1]");
        assert_eq!(c.local_port, "51000");
        assert_eq!(c.remote_address, "[2001:db8::2]");
        assert_eq!(c.remote_port, "22");
    }

    #[test]
    fn missing_header_fields_stay_empty() {
        let raw = "p77\nf3\nPTCP\nn*:9000\nTST=LISTEN\n";
        let procs = parse_plain(raw, &FilterConfig::default()).unwrap();
        assert_eq!(procs[0].name, "");
        assert_eq!(procs[0].owner, "");
    }

    #[test]
    fn unknown_tags_and_short_t_lines_are_ignored() {
        let raw = "p8\ncx\nLy\nf3\nPTCP\nT\nTQR=0\nZzz\nn*:7\nTST=LISTEN\n";
        let procs = parse_plain(raw, &FilterConfig::default()).unwrap();
        assert_eq!(procs[0].connections[0].status, "LISTEN");
    }

    #[test]
    fn working_directory_not_looked_up_by_default() {
        let source = FakeSource::default();
        parse(MULTI_SAMPLE, &FilterConfig::default(), &source).unwrap();
        assert!(source.lookups.lock().unwrap().is_empty());
    }
}

//! Device I/O: opening evdev nodes, grabbing them exclusively, and
//! translating raw `input_event` records into the crate's normalized
//! [`ButtonEvent`] stream (spec §1: an external collaborator to the
//! matched core, but still part of a runnable binary).
//!
//! Grounded on `event.rs`'s raw `libc::read`/`libc::write` framing and
//! its `EVIOCGNAME`/`EVIOCGBIT` ioctl helpers; `EVIOCGRAB` is added
//! here for exclusive device acquisition, which the template's
//! pipe-filter architecture never needed (it read already-grabbed
//! events from `intercept` on stdin).

use crate::error::DeviceError;
use crate::model::{Action, Button, ButtonEvent, DeviceBinding, EventCodeSpec};
use input_linux_sys::{input_event, EV_KEY, EV_LED, EV_REL, EV_REP, EV_SYN};
use libc::{ioctl, c_ulong};
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::mem::size_of;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::warn;

/// Reads exactly one `input_event` from a raw file descriptor,
/// retrying on `EINTR`. `Ok(None)` means clean EOF before any bytes
/// of the next event were read.
fn read_event_raw(fd: RawFd) -> io::Result<Option<input_event>> {
    let mut buf = vec![0u8; size_of::<input_event>()];
    let mut bytes_read = 0;
    let total = buf.len();

    while bytes_read < total {
        let result = unsafe {
            libc::read(fd, buf.as_mut_ptr().add(bytes_read) as *mut libc::c_void, total - bytes_read)
        };
        match result {
            -1 => {
                let err = io::Error::last_os_error();
                if err.kind() != ErrorKind::Interrupted {
                    return Err(err);
                }
            }
            0 => {
                if bytes_read == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(ErrorKind::UnexpectedEof, "EOF reached mid-event"));
            }
            n if n > 0 => bytes_read += n as usize,
            _ => return Err(io::Error::other("libc::read returned unexpected value")),
        }
    }

    let event: input_event = unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const _) };
    Ok(Some(event))
}

fn event_microseconds(event: &input_event) -> u64 {
    let sec = event.time.tv_sec as u64;
    let usec = event.time.tv_usec as u64;
    sec * 1_000_000 + usec
}

const fn ior(ty: u8, nr: u8, size: usize) -> c_ulong {
    ((2u64 << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | (nr as u64)) as c_ulong
}

const EVIOCGNAME_LEN: usize = 256;
const EVIOCGNAME_IOCTL: c_ulong = ior(b'E', 0x06, EVIOCGNAME_LEN);
const EVIOCGRAB_IOCTL: c_ulong = ((1u64 << 30) | ((size_of::<i32>() as u64) << 16) | ((b'E' as u64) << 8) | 0x90) as c_ulong;

fn eviocgbit_ioctl(ty: u8, len: usize) -> c_ulong {
    ior(b'E', 0x20 + ty, len)
}

fn eviocgname(fd: RawFd, buf: &mut [u8; 256]) -> io::Result<String> {
    let res = unsafe { ioctl(fd, EVIOCGNAME_IOCTL, buf.as_mut_ptr()) };
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        let nul = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..nul]).to_string())
    }
}

fn eviocgbit(fd: RawFd, ev_type: u8, buf: &mut [u8]) -> io::Result<()> {
    let ioctl_num = eviocgbit_ioctl(ev_type, buf.len());
    let res = unsafe { ioctl(fd, ioctl_num, buf.as_mut_ptr()) };
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn eviocgrab(fd: RawFd, grab: bool) -> io::Result<()> {
    let val: i32 = if grab { 1 } else { 0 };
    let res = unsafe { ioctl(fd, EVIOCGRAB_IOCTL, val) };
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn is_bit_set(buf: &[u8], bit: usize) -> bool {
    let byte_index = bit / 8;
    let bit_index = bit % 8;
    byte_index < buf.len() && (buf[byte_index] & (1 << (bit_index % 8))) != 0
}

/// Prints available `/dev/input/event*` nodes and a summary of their
/// capabilities to stderr. Requires read access to the nodes, which
/// in practice means root.
pub fn list_devices() -> io::Result<()> {
    eprintln!("{:<20} {:<30} capabilities", "device", "name");

    let mut entries: Vec<_> = fs::read_dir("/dev/input/")?
        .filter_map(|e| {
            let e = e.ok()?;
            let path = e.path();
            let name = path.file_name()?.to_str()?;
            if name.starts_with("event") {
                let num = name.trim_start_matches("event").parse::<u64>().ok();
                Some((path, num))
            } else {
                None
            }
        })
        .collect();
    entries.sort_by_key(|(_, n)| *n);

    for (path, _) in entries {
        let path_str = path.display().to_string();
        let file = match OpenOptions::new().read(true).custom_flags(libc::O_NONBLOCK).open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("{path_str:<20} {:<30} error opening: {e}", "");
                continue;
            }
        };
        let fd = file.as_raw_fd();

        let mut name_buf = [0u8; 256];
        let device_name = eviocgname(fd, &mut name_buf).unwrap_or_else(|_| "<unknown>".to_string());

        let mut caps = Vec::new();
        let type_bits_size = (input_linux_sys::EV_MAX / 8) + 1;
        let mut type_bits = vec![0u8; type_bits_size as usize];
        if eviocgbit(fd, 0, &mut type_bits).is_ok() {
            if is_bit_set(&type_bits, EV_KEY as usize) {
                caps.push("EV_KEY");
            }
            if is_bit_set(&type_bits, EV_REL as usize) {
                caps.push("EV_REL");
            }
            if is_bit_set(&type_bits, EV_LED as usize) {
                caps.push("EV_LED");
            }
            if is_bit_set(&type_bits, EV_REP as usize) {
                caps.push("EV_REP");
            }
            if is_bit_set(&type_bits, EV_SYN as usize) {
                caps.push("EV_SYN");
            }
        }
        eprintln!("{path_str:<20} {device_name:<30} {}", caps.join(", "));
    }
    Ok(())
}

/// Tracks, for one opened device, the mapping from `(ev_type, code)`
/// to the button number(s) it was bound to, so a raw `input_event`
/// can be normalized without re-scanning the config on every read.
struct CodeMapping {
    button: Button,
    spec: EventCodeSpec,
}

pub struct DeviceReader {
    fd: RawFd,
    path: String,
    mappings: HashMap<(u16, u16), Vec<CodeMapping>>,
    pending: std::collections::VecDeque<ButtonEvent>,
    /// `(ev_type, code)` pairs already warned about for this device, so
    /// an unbound control held or repeated doesn't flood the log
    /// (spec §7 `UnknownEventCode`: warn once per device/code).
    warned_unknown: HashSet<(u16, u16)>,
    /// Events dropped this read cycle for matching no configured
    /// binding. Drained by the caller into [`crate::stats::StatsCollector`]
    /// via [`DeviceReader::take_unknown_count`].
    unknown_count: u64,
}

impl DeviceReader {
    /// Opens and, unless `binding.shared`, exclusively grabs the
    /// device. `button_numbers` is the slice of global button numbers
    /// assigned to `binding.codes` in order (see
    /// [`crate::model::flatten_button_numbers`]).
    pub fn open(binding: &DeviceBinding, button_numbers: &[Button]) -> Result<Self, DeviceError> {
        let file = OpenOptions::new()
            .read(true)
            .write(false)
            .custom_flags(0)
            .open(&binding.path)
            .map_err(|source| DeviceError::Open { path: binding.path.clone(), source })?;
        let fd = file.as_raw_fd();
        std::mem::forget(file); // fd lifetime is managed by this struct, not the File wrapper.

        if !binding.shared {
            if let Err(source) = eviocgrab(fd, true) {
                unsafe { libc::close(fd) };
                return Err(DeviceError::Open { path: binding.path.clone(), source });
            }
        }

        let mut mappings: HashMap<(u16, u16), Vec<CodeMapping>> = HashMap::new();
        for (spec, &button) in binding.codes.iter().zip(button_numbers.iter()) {
            mappings
                .entry((spec.ev_type, spec.code))
                .or_default()
                .push(CodeMapping { button, spec: *spec });
        }

        Ok(DeviceReader {
            fd,
            path: binding.path.clone(),
            mappings,
            pending: std::collections::VecDeque::new(),
            warned_unknown: HashSet::new(),
            unknown_count: 0,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns and resets the count of events dropped since the last
    /// call for matching no configured binding.
    pub fn take_unknown_count(&mut self) -> u64 {
        std::mem::take(&mut self.unknown_count)
    }

    /// Reads and normalizes the next event that matches a configured
    /// binding. Skips `EV_SYN`/`EV_MSC` and any event not bound to a
    /// button. Returns `Ok(None)` on clean EOF (device removed).
    pub fn next_button_event(&mut self) -> Result<Option<ButtonEvent>, DeviceError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        loop {
            let raw = read_event_raw(self.fd).map_err(|source| DeviceError::Lost { path: self.path.clone(), source })?;
            let raw = match raw {
                Some(e) => e,
                None => return Ok(None),
            };

            let candidates = match self.mappings.get(&(raw.type_, raw.code)) {
                Some(c) => c,
                None => {
                    self.unknown_count += 1;
                    if self.warned_unknown.insert((raw.type_, raw.code)) {
                        warn!(
                            path = %self.path,
                            ev_type = raw.type_,
                            code = raw.code,
                            "unknown event code, no configured binding; ignoring (further occurrences of this code on this device are logged only in stats)"
                        );
                    }
                    continue;
                }
            };

            let t = event_microseconds(&raw);
            for mapping in candidates {
                self.normalize(mapping, raw.value, t);
            }
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
        }
    }

    /// Normalizes one raw `(type, code, value)` triple matched by
    /// `mapping`, queuing zero or more `ButtonEvent`s in `pending`.
    /// `EV_REL` bindings produce an immediate Down followed by an Up
    /// (spec §6: auto-release, since relative axes have no release
    /// edge of their own).
    fn normalize(&mut self, mapping: &CodeMapping, value: i32, t: u64) {
        if mapping.spec.is_auto_release() {
            let triggers = mapping.spec.value.is_some_and(|want| {
                if want >= 0 {
                    value >= want && want > 0
                } else {
                    value <= want
                }
            });
            if triggers {
                self.pending.push_back(ButtonEvent { button: mapping.button, action: Action::Down, t });
                self.pending.push_back(ButtonEvent { button: mapping.button, action: Action::Up, t });
            }
            return;
        }

        match mapping.spec.value {
            None => match value {
                1 => self.pending.push_back(ButtonEvent { button: mapping.button, action: Action::Down, t }),
                0 => self.pending.push_back(ButtonEvent { button: mapping.button, action: Action::Up, t }),
                _ => {}
            },
            Some(want) if want == value => {
                self.pending.push_back(ButtonEvent { button: mapping.button, action: Action::Down, t })
            }
            Some(_) => {}
        }
    }
}

impl Drop for DeviceReader {
    fn drop(&mut self) {
        let _ = eviocgrab(self.fd, false);
        unsafe { libc::close(self.fd) };
    }
}

// platform wait/wake backends, exactly one compiled in per target

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub(crate) use linux::{wait, wait_timeout, wake_all, wake_one};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::{wait, wait_timeout, wake_all, wake_one};

#[cfg(not(any(target_os = "linux", windows)))]
compile_error!("ward-word needs a futex or wait-on-address backend (linux or windows)");

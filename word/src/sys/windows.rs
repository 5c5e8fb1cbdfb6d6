// wait-on-address backed wait/wake

use std::sync::atomic::AtomicU32;
use std::time::Duration;

use windows_sys::Win32::Foundation::{GetLastError, ERROR_TIMEOUT};
use windows_sys::Win32::System::Threading::{
    WaitOnAddress, WakeByAddressAll, WakeByAddressSingle, INFINITE,
};

pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    // safety: both addresses point at live u32s for the duration of the call
    unsafe {
        WaitOnAddress(
            word.as_ptr().cast(),
            (&expected as *const u32).cast(),
            std::mem::size_of::<u32>(),
            INFINITE,
        );
    }
}

// returns false only on timeout
pub(crate) fn wait_timeout(word: &AtomicU32, expected: u32, timeout: Duration) -> bool {
    // round sub-millisecond timeouts up so they actually block
    let millis = timeout
        .as_nanos()
        .div_ceil(1_000_000)
        .min(u128::from(INFINITE - 1)) as u32;

    // safety: both addresses point at live u32s for the duration of the call
    let woken = unsafe {
        WaitOnAddress(
            word.as_ptr().cast(),
            (&expected as *const u32).cast(),
            std::mem::size_of::<u32>(),
            millis,
        )
    };
    // safety: GetLastError has no preconditions
    woken != 0 || unsafe { GetLastError() } != ERROR_TIMEOUT
}

pub(crate) fn wake_one(word: &AtomicU32) {
    // safety: the address points at a live u32
    unsafe { WakeByAddressSingle(word.as_ptr().cast()) }
}

pub(crate) fn wake_all(word: &AtomicU32) {
    // safety: the address points at a live u32
    unsafe { WakeByAddressAll(word.as_ptr().cast()) }
}

// futex-backed wait/wake
//
// the words are always process-private, so FUTEX_PRIVATE_FLAG is set
// unconditionally (skips the cross-process hash table in the kernel)

use std::ptr;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

#[inline]
fn futex(word: &AtomicU32, op: libc::c_int, val: u32, timeout: *const libc::timespec) -> i64 {
    // safety: the word address is valid for the duration of the call and
    // the argument shapes match FUTEX_WAIT / FUTEX_WAKE
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            op | libc::FUTEX_PRIVATE_FLAG,
            val,
            timeout,
            ptr::null::<u32>(),
            0u32,
        ) as i64
    }
}

pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    // EAGAIN (value already changed), EINTR (signal) and genuine wakes all
    // count as spurious returns; the caller re-checks in a loop
    futex(word, libc::FUTEX_WAIT, expected, ptr::null());
}

// returns false only on timeout
pub(crate) fn wait_timeout(word: &AtomicU32, expected: u32, timeout: Duration) -> bool {
    let ts = libc::timespec {
        tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as _,
    };
    if futex(word, libc::FUTEX_WAIT, expected, &ts) == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ETIMEDOUT)
}

pub(crate) fn wake_one(word: &AtomicU32) {
    futex(word, libc::FUTEX_WAKE, 1, ptr::null());
}

pub(crate) fn wake_all(word: &AtomicU32) {
    futex(word, libc::FUTEX_WAKE, i32::MAX as u32, ptr::null());
}

//! Event identifiers: `evt_<millis base36>_<6 random base36 chars>`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

const ID_PREFIX: &str = "evt";
const SUFFIX_LEN: u32 = 6;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Where the store gets ids for new events.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Generates event ids whose timestamp part strictly increases per generator.
///
/// The random suffix only makes collisions with ids minted by other
/// processes unlikely; it does not guarantee uniqueness. Callers check the
/// current collection before accepting an id.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator::default()
    }

    fn next_id_at(&self, now_millis: u64) -> String {
        let millis = self.reserve_millis(now_millis);
        format!("{}_{}_{}", ID_PREFIX, to_base36(millis), random_suffix())
    }

    /// Claim a timestamp greater than any previously handed out.
    fn reserve_millis(&self, now_millis: u64) -> u64 {
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = now_millis.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl IdSource for IdGenerator {
    fn next_id(&self) -> String {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.next_id_at(now)
    }
}

pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    // Only ASCII digits were pushed
    String::from_utf8_lossy(&digits).into_owned()
}

fn random_suffix() -> String {
    let space = 36u128.pow(SUFFIX_LEN);
    let n = Uuid::new_v4().as_u128() % space;
    format!("{:0>width$}", to_base36(n as u64), width = SUFFIX_LEN as usize)
}

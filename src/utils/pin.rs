use rand::Rng;

/// Length of a session join code.
pub const PIN_LENGTH: usize = 6;

/// How many fresh codes a store tries before giving up on a collision streak.
pub const PIN_ATTEMPTS: usize = 32;

/// Produces a random join code of `PIN_LENGTH` decimal digits.
pub fn generate_pin() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

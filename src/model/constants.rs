// Engine constants
pub const RATING_START: i32 = 1000;
pub const RATING_FLOOR: i32 = 800;
pub const RATING_GAP_THRESHOLD: i32 = 50;
pub const STRONG_WIN_DELTA: i32 = 25;
pub const STRONG_LOSS_DELTA: i32 = 15;
pub const EVEN_WIN_DELTA: i32 = 15;
pub const EVEN_LOSS_DELTA: i32 = 15;
pub const WEAK_WIN_DELTA: i32 = 8;
pub const WEAK_LOSS_DELTA: i32 = 25;
// Race finance constants
pub const MIN_RACE_DRIVERS: usize = 3;
pub const FIRST_PLACE_SPLIT: f64 = 0.60;
pub const SECOND_PLACE_SPLIT: f64 = 0.25;
pub const THIRD_PLACE_SPLIT: f64 = 0.15;
pub const FINAL_POT_RATE: f64 = 0.05;
// Challenges take a single fixed commission rather than the race set
pub const CHALLENGE_COMMISSION_RATE: f64 = 0.15;
// Default flat race points (podium-only settlement)
pub const RACE_POINTS_FIRST: i32 = 25;
pub const RACE_POINTS_SECOND: i32 = 15;
pub const RACE_POINTS_THIRD: i32 = 10;
pub const RACE_POINTS_OTHER: i32 = 5;
// Season reward constants
pub const KING_RATING_BONUS: i32 = 50;
pub const NIGHT_PREDATOR_RATING_BONUS: i32 = 25;

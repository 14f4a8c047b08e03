
// Currently the only device supported here is the Stanford Research Systems SR830 lock-in amplifier.
// Other lock-ins (SR810, SR850) speak a close dialect and would get their own modules next to it.

pub mod sr830;

mod clock;

pub(crate) use clock::ClockReplacer;

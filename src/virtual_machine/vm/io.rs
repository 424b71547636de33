use num_bigint::BigInt;
use std::fmt;

/// Output callback registered on a machine.
pub type OutputFn = Box<dyn FnMut(&BigInt) -> SinkControl>;

/// What a sink wants to happen to itself after handling a value.
pub enum SinkControl {
    /// Stay registered.
    Keep,
    /// Deregister; later values are buffered on the machine.
    Detach,
    /// Deregister and install another sink for the next value.
    Replace(OutputFn),
}

impl fmt::Debug for SinkControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkControl::Keep => write!(f, "Keep"),
            SinkControl::Detach => write!(f, "Detach"),
            SinkControl::Replace(_) => write!(f, "Replace(..)"),
        }
    }
}

/// Output side of a machine: the registered sink, or a buffer when none is.
#[derive(Default)]
pub(super) struct Output {
    sink: Option<OutputFn>,
    buffer: Vec<BigInt>,
}

impl Output {
    /// Delivers one value: to the sink if present, otherwise into the buffer.
    pub(super) fn emit(&mut self, value: BigInt) {
        let Some(sink) = self.sink.as_mut() else {
            self.buffer.push(value);
            return;
        };
        match sink(&value) {
            SinkControl::Keep => {}
            SinkControl::Detach => self.sink = None,
            SinkControl::Replace(next) => self.sink = Some(next),
        }
    }

    pub(super) fn attach(&mut self, sink: OutputFn) {
        self.sink = Some(sink);
    }

    pub(super) fn detach(&mut self) -> Option<OutputFn> {
        self.sink.take()
    }

    pub(super) fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub(super) fn buffered(&self) -> &[BigInt] {
        &self.buffer
    }

    pub(super) fn take_buffered(&mut self) -> Vec<BigInt> {
        std::mem::take(&mut self.buffer)
    }

    pub(super) fn set_buffered(&mut self, values: Vec<BigInt>) {
        self.buffer = values;
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn buffers_without_sink() {
        let mut out = Output::default();
        out.emit(BigInt::from(1));
        out.emit(BigInt::from(2));
        assert_eq!(out.buffered(), &[BigInt::from(1), BigInt::from(2)]);
        assert_eq!(out.take_buffered().len(), 2);
        assert!(out.buffered().is_empty());
    }

    #[test]
    fn sink_keep_receives_every_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut out = Output::default();
        out.attach(Box::new(move |v: &BigInt| {
            log.borrow_mut().push(v.clone());
            SinkControl::Keep
        }));
        out.emit(BigInt::from(5));
        out.emit(BigInt::from(6));
        assert_eq!(*seen.borrow(), vec![BigInt::from(5), BigInt::from(6)]);
        assert!(out.buffered().is_empty());
    }

    #[test]
    fn sink_detach_falls_back_to_buffer() {
        let mut out = Output::default();
        out.attach(Box::new(|_: &BigInt| SinkControl::Detach));
        out.emit(BigInt::from(1));
        assert!(!out.has_sink());
        out.emit(BigInt::from(2));
        assert_eq!(out.buffered(), &[BigInt::from(2)]);
    }

    #[test]
    fn sink_replace_switches_handler() {
        let second = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&second);
        let mut out = Output::default();
        out.attach(Box::new(move |_: &BigInt| {
            let log = Rc::clone(&log);
            SinkControl::Replace(Box::new(move |v: &BigInt| {
                log.borrow_mut().push(v.clone());
                SinkControl::Keep
            }))
        }));
        out.emit(BigInt::from(10));
        out.emit(BigInt::from(20));
        out.emit(BigInt::from(30));
        assert_eq!(*second.borrow(), vec![BigInt::from(20), BigInt::from(30)]);
    }
}

use crate::domain::ClockDomain;

/// A synchronous component evaluated once per step of its clock domain.
///
/// `step` samples the inputs for one clock step and returns the registered
/// outputs as they stand after the clock edge. Every piece of state that
/// survives between steps lives in the implementor; there is no other memory.
pub trait Clocked {
    /// Signals sampled on each step.
    type Input;
    /// Registered signals visible after each step.
    type Output;

    /// Evaluate one clock step.
    fn step(&mut self, input: &Self::Input) -> Self::Output;

    /// The domain whose clock drives [`Clocked::step`].
    fn domain(&self) -> &ClockDomain;
}

/// Drive `component` with one input per step, collecting every output.
pub fn run<C, I>(component: &mut C, inputs: I) -> Vec<C::Output>
where
    C: Clocked,
    I: IntoIterator,
    I::Item: std::borrow::Borrow<C::Input>,
{
    use std::borrow::Borrow;

    inputs
        .into_iter()
        .map(|input| component.step(input.borrow()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registers its input: output lags input by one step.
    struct Register {
        value: u8,
        domain: ClockDomain,
    }

    impl Clocked for Register {
        type Input = u8;
        type Output = u8;

        fn step(&mut self, input: &u8) -> u8 {
            let out = self.value;
            self.value = *input;
            out
        }

        fn domain(&self) -> &ClockDomain {
            &self.domain
        }
    }

    #[test]
    fn run_steps_once_per_input() {
        let mut reg = Register {
            value: 0,
            domain: ClockDomain::default(),
        };
        let outputs = run(&mut reg, [1u8, 2, 3]);
        assert_eq!(outputs, vec![0, 1, 2]);
        assert_eq!(reg.domain().name(), "usb");
    }

    #[test]
    fn run_accepts_borrowed_inputs() {
        let mut reg = Register {
            value: 9,
            domain: ClockDomain::default(),
        };
        let inputs = vec![4u8, 5];
        let outputs = run(&mut reg, &inputs);
        assert_eq!(outputs, vec![9, 4]);
    }
}

use anyhow::anyhow;

/// Connectivity represents the "connected" state of a fake driven port and provides
/// common behavior for failing a call when the port is configured to act like its
/// backing service is down.
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    /// Return an error if connectivity is in a "disconnected" state
    pub fn blow_up_if_disconnected(&self) -> Result<(), anyhow::Error> {
        match self {
            Self::Connected => Ok(()),
            Self::Disconnected => Err(anyhow!("could not reach the backing service")),
        }
    }
}

/// FakeCall is an argument-capturing stand-in for a single mocked trait function.
/// It records the arguments of every invocation and hands back a preconfigured
/// outcome, which makes it easy to mock async trait functions without a mocking
/// framework.
///
/// * [Args] is the tuple of arguments captured per call
/// * [Ret] is the function's return type
///
/// Mock trait implementations lock a [std::sync::Mutex] around a struct of
/// FakeCalls so the interior can be mutated through `&self`:
///
/// ```ignore
/// impl SomePort for Mutex<MockSomeService> {
///     async fn operation(&self, input: i64) -> anyhow::Result<i64> {
///         let mut locked_self = self.lock().expect("mock service mutex poisoned");
///         locked_self.operation_result.record(input);
///         locked_self.operation_result.anyhow_result()
///     }
/// }
/// ```
pub struct FakeCall<Args, Ret> {
    recorded_calls: Vec<Args>,
    outcome: Option<Ret>,
}

impl<Args, Ret> FakeCall<Args, Ret> {
    pub fn new() -> FakeCall<Args, Ret> {
        FakeCall {
            recorded_calls: Vec::new(),
            outcome: None,
        }
    }

    /// Captures the arguments of a single invocation
    pub fn record(&mut self, args: Args) {
        self.recorded_calls.push(args);
    }

    /// The arguments passed on every call so far, in call order
    pub fn calls(&self) -> &[Args] {
        &self.recorded_calls
    }
}

impl<Args, Success, Fail> FakeCall<Args, Result<Success, Fail>>
where
    Success: Clone,
    Fail: Clone,
{
    /// Configure the result handed back on invocation. [Result] itself is not [Clone],
    /// so this exists for results whose contained values can be cloned.
    pub fn set_result(&mut self, outcome: Result<Success, Fail>) {
        self.outcome = Some(outcome);
    }

    pub fn result(&self) -> Result<Success, Fail> {
        match self.outcome {
            Some(Ok(ref success)) => Ok(success.clone()),
            Some(Err(ref fail)) => Err(fail.clone()),
            None => panic!("a fake was invoked without a configured outcome"),
        }
    }
}

impl<Args, Success> FakeCall<Args, anyhow::Result<Success>>
where
    Success: Clone,
{
    /// Configure the result handed back on invocation. [anyhow::Error] is not [Clone],
    /// so errors are reconstructed from their message on every retrieval.
    pub fn set_anyhow_result(&mut self, outcome: anyhow::Result<Success>) {
        match outcome {
            Ok(success) => self.outcome = Some(Ok(success)),
            Err(err) => self.outcome = Some(Err(anyhow!(format!("{err}")))),
        }
    }

    pub fn anyhow_result(&self) -> anyhow::Result<Success> {
        match self.outcome {
            Some(Ok(ref success)) => Ok(success.clone()),
            Some(Err(ref err)) => Err(anyhow!(format!("{err}"))),
            None => panic!("a fake was invoked without a configured outcome"),
        }
    }
}

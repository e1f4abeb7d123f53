pub type MockClosureSignature<I, R> = Box<dyn Fn(I) -> R + Send + Sync>;

/// A mocked function. It answers calls with a closure (or a cycle of closures) and counts
/// how many times it has been called.
pub struct MockMethod<I, R> {
    imp: MockImpl<I, R>,
    call_count: usize,
}

enum MockImpl<I, R> {
    Fixed(MockClosureSignature<I, R>),
    Sequence(Vec<MockClosureSignature<I, R>>),
}

impl<I, R> std::default::Default for MockMethod<I, R> {
    fn default() -> Self {
        Self::new_unimplemented()
    }
}

impl<I, R> MockMethod<I, R> {
    fn with_imp(imp: MockImpl<I, R>) -> Self {
        Self { imp, call_count: 0 }
    }

    /// Panics when called. Use this for host methods a test expects never to be reached.
    pub fn new_unimplemented() -> Self {
        Self::with_imp(MockImpl::Fixed(Box::new(|_| unimplemented!())))
    }

    pub fn new_default() -> Self
    where
        R: Default,
    {
        Self::with_imp(MockImpl::Fixed(Box::new(|_| R::default())))
    }

    /// Always return a clone of `value`.
    pub fn new_value(value: R) -> Self
    where
        R: Clone + Send + Sync + 'static,
    {
        Self::with_imp(MockImpl::Fixed(Box::new(move |_| value.clone())))
    }

    pub fn new_fixed(closure: MockClosureSignature<I, R>) -> Self {
        Self::with_imp(MockImpl::Fixed(closure))
    }

    /// Answer the n-th call with `closures[n % closures.len()]`.
    pub fn new_sequence(closures: Vec<MockClosureSignature<I, R>>) -> Self {
        assert!(!closures.is_empty(), "A mock sequence needs at least one closure");
        Self::with_imp(MockImpl::Sequence(closures))
    }

    pub fn call(&mut self, args: I) -> R {
        let cur_call = self.call_count;
        self.call_count += 1;

        match &self.imp {
            MockImpl::Fixed(closure) => closure(args),
            MockImpl::Sequence(closures) => closures[cur_call % closures.len()](args),
        }
    }

    pub fn is_called(&self) -> bool {
        self.call_count > 0
    }

    pub fn call_count(&self) -> usize {
        self.call_count
    }
}

// Tests with the prefix 'mock_test_' use MockHost or SimulatedHost. Both are process-wide, so
// every test wraps its body in `with_mockhost()` or `with_simulated_host()`, which run serially.
// Each test creates its own controller with the helpers in `crate::util::test_util::fixtures`.

// Common includes for mock tests.
pub(crate) mod mock_test_prelude {
    pub use crate::host::*;
    pub use crate::oob_manager;
    pub use crate::util::test_util::fixtures::*;
    pub use crate::util::test_util::mock_host::*;
    pub use crate::util::test_util::mock_method::*;
    pub use crate::util::test_util::simulated_host::*;
    pub use crate::{OOBAction, OOBError, StatKey};
}

mod mock_test_oob_major;
mod mock_test_oob_sweep;

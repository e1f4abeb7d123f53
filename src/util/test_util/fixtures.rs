use crate::host::HostBinding;
use crate::oob_manager;
use crate::{OOBController, OOBControllerBuilder};

/// Create a controller with the built-in default options, and make it `'static` so it can be
/// registered with a host. Each test gets its own controller, and the few bytes leaked per test
/// do not matter.
pub fn create_oob<H: HostBinding>() -> &'static OOBController<H> {
    create_oob_with_options("")
}

/// Like `create_oob()`, with options given as `"name=value name=value"`.
pub fn create_oob_with_options<H: HostBinding>(options: &str) -> &'static OOBController<H> {
    let mut builder = OOBControllerBuilder::new_no_env_vars();
    assert!(
        oob_manager::process_bulk(&mut builder, options),
        "Invalid test options: {:?}",
        options
    );
    Box::leak(oob_manager::oob_init(&builder))
}

/// Create a controller and set it up.
pub fn create_installed_oob<H: HostBinding>() -> &'static OOBController<H> {
    let oob = create_oob();
    assert!(oob_manager::setup(oob));
    oob
}

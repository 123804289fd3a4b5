use pretty_assertions::assert_eq;

use chunkhtml::pool::{config, configure, PoolConfig, SizeTier};
use chunkhtml::{render_to_string, tags::p, Context};

// Runs in its own test binary so nothing has touched the pools before `configure`.
#[test]
fn configure_installs_once_and_rejects_later_configs() {
    let custom = PoolConfig {
        max_idle: 2,
        small_tier: 16,
        medium_tier: 64,
        ..PoolConfig::default()
    };
    assert_eq!(configure(custom.clone()), Ok(()));
    assert_eq!(config(), &custom);
    assert_eq!(SizeTier::for_estimate(17), SizeTier::Medium);
    assert_eq!(SizeTier::for_estimate(65), SizeTier::Large);

    let rejected = PoolConfig::default();
    assert_eq!(configure(rejected.clone()), Err(rejected));
    assert_eq!(config(), &custom);

    assert_eq!(
        render_to_string(Context::background(), &p("still renders").into()).unwrap(),
        "<p>still renders</p>"
    );
}

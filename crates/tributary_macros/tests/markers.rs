// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for applying the marker attributes to real items.

use tributary_macros::{contributes_binding, contributes_to, merge_component, merge_modules, merge_subcomponent, module};

pub struct AppScope;

pub trait Api {
    fn name(&self) -> &'static str;
}

pub struct LegacyImpl;

#[contributes_binding(AppScope, bound_type = Api, replaces = [LegacyImpl], priority = -1)]
#[derive(Debug, Default)]
pub struct Impl1 {
    calls: u32,
}

impl Api for Impl1 {
    fn name(&self) -> &'static str {
        "impl1"
    }
}

#[contributes_binding(AppScope)]
pub enum Mode {
    Fast,
}

#[module]
#[contributes_to(AppScope, replaces = [LegacyImpl])]
pub struct NetworkModule;

#[merge_component(AppScope, exclude = [Mode])]
pub trait AppComponent {
    fn api(&self) -> Box<dyn Api>;
}

#[merge_subcomponent(AppScope)]
pub trait RequestComponent {}

#[merge_modules(AppScope)]
pub struct AppModules;

struct Wiring;

impl AppComponent for Wiring {
    fn api(&self) -> Box<dyn Api> {
        Box::new(Impl1::default())
    }
}

#[test]
fn marked_items_keep_their_shape() {
    let api = Wiring.api();
    assert_eq!(api.name(), "impl1");

    let impl1 = Impl1 { calls: 3 };
    assert_eq!(impl1.calls, 3);
    assert!(matches!(Mode::Fast, Mode::Fast));

    let _ = (AppScope, LegacyImpl, NetworkModule, AppModules);
}

//! trybuild 编译期测试: 宏展开的代码能通过编译

#[test]
fn trybuild_weld_macros() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/qualifier_derive.rs");
    t.pass("tests/trybuild/client_proxy_trait.rs");
}

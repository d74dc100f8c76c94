//! Tests for the stepping policy and the scan loop.

mod common;

use common::MockHost;
use mojostep_core::host::ExecutionMode;
use mojostep_core::stepping::{
    decide, run_to_handler, step_into_message_and_set_flag, step_out_of_hook, ScanOutcome, StepDecision,
};
use mojostep_core::types::SourceInfo;

const DISPATCH_FRAME: &str = "app!mojo::InterfaceEndpointClient::HandleValidatedMessage";

fn frames(list: &[&str]) -> Vec<String>
{
    list.iter().map(|f| (*f).to_string()).collect()
}

fn mojom_source() -> SourceInfo
{
    SourceInfo::from_full_path("gen/content/common/frame.mojom.cc", 1234)
}

#[test]
fn test_decide_steps_into_on_the_dispatch_frame()
{
    let stack = frames(&[DISPATCH_FRAME, "app!mojo::Connector::DispatchMessage"]);
    assert_eq!(decide(&stack, None), StepDecision::Step(ExecutionMode::StepInto));
}

#[test]
fn test_decide_steps_over_one_frame_above_the_anchor()
{
    let stack = frames(&["app!std::__1::vector<unsigned char>::size", DISPATCH_FRAME]);
    assert_eq!(decide(&stack, None), StepDecision::Step(ExecutionMode::StepOver));
}

#[test]
fn test_decide_steps_out_when_deep_in_a_detour()
{
    let stack = frames(&[
        "app!logging::CheckError",
        "app!base::allocator::Alloc",
        DISPATCH_FRAME,
    ]);
    assert_eq!(decide(&stack, None), StepDecision::Step(ExecutionMode::StepOut));

    let deeper = frames(&[
        "app!a",
        "app!b",
        "app!c",
        "app!d",
        "app!e",
        DISPATCH_FRAME,
    ]);
    assert_eq!(decide(&deeper, None), StepDecision::Step(ExecutionMode::StepOut));
}

#[test]
fn test_decide_abandons_when_no_anchor_in_the_window()
{
    let stack = frames(&["app!a", "app!b", "app!c", "app!d", "app!e", "app!f"]);
    assert_eq!(decide(&stack, None), StepDecision::Abandon);
    assert_eq!(decide(&[], None), StepDecision::Abandon);
}

#[test]
fn test_decide_short_stack_without_anchor_uses_its_length_as_depth()
{
    // The anchor sits below what the host returned, not off the path
    let three_deep = frames(&["app!a", "app!b", "app!c"]);
    assert_eq!(decide(&three_deep, None), StepDecision::Step(ExecutionMode::StepOut));

    let one_deep = frames(&["app!a"]);
    assert_eq!(decide(&one_deep, None), StepDecision::Step(ExecutionMode::StepOver));
}

#[test]
fn test_decide_anchor_pushed_past_the_window_is_abandoned()
{
    // Seventh frame would be the anchor; the window only covers six
    let stack = frames(&["app!a", "app!b", "app!c", "app!d", "app!e", "app!f", DISPATCH_FRAME]);
    assert_eq!(decide(&stack, None), StepDecision::Abandon);
}

#[test]
fn test_decide_accept_frame_counts_as_anchor()
{
    let stack = frames(&["app!content::mojom::FrameHostStub::Accept", DISPATCH_FRAME]);
    assert_eq!(decide(&stack, None), StepDecision::Step(ExecutionMode::StepInto));

    let with_responder = frames(&["app!content::mojom::WidgetStub::AcceptWithResponder", DISPATCH_FRAME]);
    assert_eq!(decide(&with_responder, None), StepDecision::Step(ExecutionMode::StepInto));
}

#[test]
fn test_decide_finds_handler_only_with_generated_source()
{
    let stack = frames(&["app!content::mojom::FrameHostStub::Accept", DISPATCH_FRAME]);

    // Accept frame without line info in a .mojom.cc file is not the handler
    assert_eq!(decide(&stack, None), StepDecision::Step(ExecutionMode::StepInto));
    let elsewhere = SourceInfo::from_full_path("mojo/public/cpp/bindings/lib/message.cc", 50);
    assert_eq!(decide(&stack, Some(&elsewhere)), StepDecision::Step(ExecutionMode::StepInto));

    let source = mojom_source();
    assert_eq!(decide(&stack, Some(&source)), StepDecision::Found);
}

#[test]
fn test_decide_generated_source_alone_is_not_the_handler()
{
    // Serialization code also lives in .mojom.cc files; the Accept frame on
    // top is what distinguishes dispatch
    let stack = frames(&["app!mojo::internal::Serialize", DISPATCH_FRAME]);
    assert_eq!(
        decide(&stack, Some(&mojom_source())),
        StepDecision::Step(ExecutionMode::StepOver)
    );
}

#[test]
fn test_run_to_handler_walks_to_the_accept_frame()
{
    let mut host = MockHost::new();
    host.set_state(&[DISPATCH_FRAME], None);
    // Step into a detour, drain it, then land in dispatch
    host.script_state(&["app!base::Lock::Acquire", "app!base::AutoLock::AutoLock", DISPATCH_FRAME], None);
    host.script_state(&["app!base::AutoLock::AutoLock", DISPATCH_FRAME], None);
    host.script_state(&[DISPATCH_FRAME], None);
    host.script_state(
        &["app!content::mojom::FrameHostStub::Accept", DISPATCH_FRAME],
        Some(mojom_source()),
    );

    let outcome = run_to_handler(&mut host).unwrap();
    assert_eq!(outcome, ScanOutcome::HandlerReached);
    assert_eq!(
        host.modes,
        vec![
            ExecutionMode::StepInto,
            ExecutionMode::StepOut,
            ExecutionMode::StepOver,
            ExecutionMode::StepInto,
        ]
    );
}

#[test]
fn test_run_to_handler_gives_up_off_the_dispatch_path()
{
    let mut host = MockHost::new();
    host.set_state(&["app!a", "app!b", "app!c", "app!d", "app!e", "app!f"], None);

    let outcome = run_to_handler(&mut host).unwrap();
    assert_eq!(outcome, ScanOutcome::Abandoned);
    assert!(host.modes.is_empty());
}

#[test]
fn test_run_to_handler_stops_at_the_iteration_cap()
{
    let mut host = MockHost::new();
    // The dispatch frame never leaves the top, so every iteration steps into
    host.set_state(&[DISPATCH_FRAME], None);

    let outcome = run_to_handler(&mut host).unwrap();
    assert_eq!(outcome, ScanOutcome::Abandoned);
    assert_eq!(host.modes.len(), 200);
    assert!(host.modes.iter().all(|mode| *mode == ExecutionMode::StepInto));
}

#[test]
fn test_step_out_of_hook_issues_the_fixed_step_count()
{
    let mut host = MockHost::new();
    step_out_of_hook(&mut host, 21).unwrap();

    assert_eq!(host.modes.len(), 21);
    assert!(host.modes.iter().all(|mode| *mode == ExecutionMode::StepOver));
    assert_eq!(host.waits, 21);
}

#[test]
fn test_manual_trigger_refuses_outside_generated_code()
{
    let mut host = MockHost::new();
    host.set_state(&["app!main"], Some(SourceInfo::from_full_path("app/main.cc", 10)));

    assert!(!step_into_message_and_set_flag(&mut host).unwrap());
    assert!(host.modes.is_empty());
    assert!(host.evaluated.is_empty());
}

#[test]
fn test_manual_trigger_sets_the_flag_in_the_constructor()
{
    let constructor_frame = "app!mojo::Message::Message(unsigned int name, unsigned int flags, \
                             unsigned long payload_size, unsigned long payload_interface_id_count, \
                             unsigned int create_message_flags, \
                             std::vector<mojo::ScopedHandle>* handles, \
                             unsigned long estimated_payload_size)";

    let mut host = MockHost::new();
    host.set_state(
        &["app!content::mojom::FrameHostProxy::DidCommitNavigation"],
        Some(mojom_source()),
    );
    // One step lands in a trivial inlined helper, the next in the constructor
    host.script_state(&["app!mojo::internal::MessageFragment::Claim"], None);
    host.script_state(&[constructor_frame], None);
    host.script_state(&[constructor_frame], None);

    assert!(step_into_message_and_set_flag(&mut host).unwrap());
    assert_eq!(host.evaluated, vec!["flags = flags | (1 << 29)".to_string()]);
    assert_eq!(
        host.modes,
        vec![
            ExecutionMode::StepInto,
            ExecutionMode::StepInto,
            ExecutionMode::StepOver,
            ExecutionMode::Continue,
        ]
    );
}

#[test]
fn test_manual_trigger_gives_up_when_constructor_never_appears()
{
    let mut host = MockHost::new();
    host.set_state(&["app!gen"], Some(mojom_source()));
    // Every subsequent suspension is somewhere unhelpful
    for _ in 0..8 {
        host.script_state(&["app!mojo::internal::Serialize"], None);
    }

    assert!(!step_into_message_and_set_flag(&mut host).unwrap());
    assert!(host.evaluated.is_empty());
    // Initial step plus five constructor-hunting attempts
    assert_eq!(host.modes.len(), 6);
    assert!(host.modes.iter().all(|mode| *mode == ExecutionMode::StepInto));
}

#[test]
fn test_manual_trigger_rejects_other_constructor_overloads()
{
    // Same class, wrong overload: no flags parameter list
    let wrong_overload = "app!mojo::Message::Message(mojo::ScopedMessageHandle handle)";

    let mut host = MockHost::new();
    host.set_state(&["app!gen"], Some(mojom_source()));
    for _ in 0..8 {
        host.script_state(&[wrong_overload], None);
    }

    assert!(!step_into_message_and_set_flag(&mut host).unwrap());
    assert!(host.evaluated.is_empty());
}

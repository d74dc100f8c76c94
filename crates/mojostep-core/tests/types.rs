//! Tests for host-agnostic types

use mojostep_core::types::{Address, ProcessId, SourceInfo, ThreadId};

#[test]
fn test_process_id_from_u32()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
}

#[test]
fn test_process_id_to_u32()
{
    let pid = ProcessId::from(54321);
    let value: u32 = pid.into();
    assert_eq!(value, 54321);
}

#[test]
fn test_process_id_equality()
{
    let pid1 = ProcessId::from(12345);
    let pid2 = ProcessId::from(12345);
    let pid3 = ProcessId::from(54321);

    assert_eq!(pid1, pid2);
    assert_ne!(pid1, pid3);
}

#[test]
fn test_thread_id_raw()
{
    let tid = ThreadId::from(7u64);
    assert_eq!(tid.raw(), 7);
}

#[test]
fn test_address_display_is_fixed_width_hex()
{
    let address = Address::new(0x1400_1000);
    assert_eq!(address.to_string(), "0x0000000014001000");
}

#[test]
fn test_address_arithmetic()
{
    let address = Address::new(0x1000);
    assert_eq!((address + 17).value(), 0x1011);
    assert_eq!((address - 0x10).value(), 0xFF0);
    assert_eq!(address.checked_add(u64::MAX), None);
}

#[test]
fn test_address_signed_displacement()
{
    let address = Address::new(0x2000);
    assert_eq!(address.offset(0x100).value(), 0x2100);
    assert_eq!(address.offset(-0x100).value(), 0x1F00);
}

#[test]
fn test_source_info_from_full_path()
{
    let source = SourceInfo::from_full_path("gen/content/common/frame.mojom.cc", 42);
    assert_eq!(source.file_name, "frame.mojom.cc");
    assert_eq!(source.file_path, "gen/content/common");
    assert_eq!(source.line, 42);
    assert!(source.file_name_ends_with(".mojom.cc"));
}

#[test]
fn test_source_info_from_windows_path()
{
    let source = SourceInfo::from_full_path("C:\\src\\chrome\\browser\\main.cc", 7);
    assert_eq!(source.file_name, "main.cc");
    assert_eq!(source.file_path, "C:\\src\\chrome\\browser");
    assert!(!source.file_name_ends_with(".mojom.cc"));
}

#[test]
fn test_source_info_bare_file_name()
{
    let source = SourceInfo::from_full_path("widget.mojom.cc", 1);
    assert_eq!(source.file_name, "widget.mojom.cc");
    assert_eq!(source.file_path, "");
}

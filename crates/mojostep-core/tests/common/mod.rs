//! Scripted in-memory host used by the integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use mojostep_core::error::{MojostepError, MojostepResult};
use mojostep_core::host::{DebugHost, ExecutionMode};
use mojostep_core::types::{Address, ProcessId, ScratchAllocation, SourceInfo, ThreadId};

/// One scripted suspension: what the target looks like after the next wait.
#[derive(Debug, Clone, Default)]
pub struct TargetState
{
    pub frames: Vec<String>,
    pub source: Option<SourceInfo>,
}

/// A `DebugHost` backed by sparse byte-addressed memory and a queue of
/// scripted suspension states. Every command the engine issues is recorded
/// so tests can assert on the exact sequence.
pub struct MockHost
{
    memory: HashMap<u64, u8>,
    symbols: HashMap<String, Address>,
    next_allocation: u64,
    pub allocation_granule: u64,
    pub allocation_count: usize,
    pub instruction_pointer: Address,
    pub process: ProcessId,
    pub thread: ThreadId,
    /// When set, focus re-selection commands are logged but do not stick.
    pub refuse_focus_changes: bool,
    pub state: TargetState,
    pub scripted_states: VecDeque<TargetState>,
    pub modes: Vec<ExecutionMode>,
    pub waits: usize,
    pub process_selects: Vec<ProcessId>,
    pub thread_selects: Vec<ThreadId>,
    pub evaluated: Vec<String>,
}

impl MockHost
{
    pub fn new() -> Self
    {
        Self {
            memory: HashMap::new(),
            symbols: HashMap::new(),
            next_allocation: 0x7000_0000,
            allocation_granule: 0x1000,
            allocation_count: 0,
            instruction_pointer: Address::ZERO,
            process: ProcessId(100),
            thread: ThreadId(1),
            refuse_focus_changes: false,
            state: TargetState::default(),
            scripted_states: VecDeque::new(),
            modes: Vec::new(),
            waits: 0,
            process_selects: Vec::new(),
            thread_selects: Vec::new(),
            evaluated: Vec::new(),
        }
    }

    pub fn load_bytes(&mut self, address: Address, bytes: &[u8])
    {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory.insert(address.value() + i as u64, *byte);
        }
    }

    pub fn define_symbol(&mut self, name: &str, address: Address)
    {
        self.symbols.insert(name.to_string(), address);
    }

    pub fn script_state(&mut self, frames: &[&str], source: Option<SourceInfo>)
    {
        self.scripted_states.push_back(TargetState {
            frames: frames.iter().map(|f| (*f).to_string()).collect(),
            source,
        });
    }

    pub fn set_state(&mut self, frames: &[&str], source: Option<SourceInfo>)
    {
        self.state = TargetState {
            frames: frames.iter().map(|f| (*f).to_string()).collect(),
            source,
        };
    }

    pub fn memory_at(&self, address: Address, len: usize) -> Vec<u8>
    {
        (0..len)
            .map(|i| *self.memory.get(&(address.value() + i as u64)).unwrap_or(&0))
            .collect()
    }
}

impl DebugHost for MockHost
{
    fn read_memory(&mut self, address: Address, len: usize) -> MojostepResult<Vec<u8>>
    {
        let mut bytes = Vec::with_capacity(len);
        for i in 0..len {
            match self.memory.get(&(address.value() + i as u64)) {
                Some(byte) => bytes.push(*byte),
                None => return Err(MojostepError::MemoryReadFailed { address, len }),
            }
        }
        Ok(bytes)
    }

    fn write_memory(&mut self, address: Address, bytes: &[u8]) -> MojostepResult<()>
    {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory.insert(address.value() + i as u64, *byte);
        }
        Ok(())
    }

    fn allocate_executable(&mut self, size: usize) -> MojostepResult<ScratchAllocation>
    {
        let granule = self.allocation_granule;
        let granted = (size as u64).div_ceil(granule) * granule;
        let address = Address::new(self.next_allocation);
        self.next_allocation += granted;
        self.allocation_count += 1;
        // Fresh executable pages read back as zeroes until written
        let zeroes = vec![0u8; granted as usize];
        self.load_bytes(address, &zeroes);
        Ok(ScratchAllocation {
            address,
            size: granted,
        })
    }

    fn resolve_symbol(&mut self, module_qualified_name: &str) -> MojostepResult<Address>
    {
        self.symbols
            .get(module_qualified_name)
            .copied()
            .ok_or_else(|| MojostepError::SymbolNotFound(module_qualified_name.to_string()))
    }

    fn instruction_pointer(&mut self) -> MojostepResult<Address>
    {
        Ok(self.instruction_pointer)
    }

    fn set_execution_mode(&mut self, mode: ExecutionMode) -> MojostepResult<()>
    {
        self.modes.push(mode);
        Ok(())
    }

    fn wait_for_suspend(&mut self, _timeout: Duration) -> MojostepResult<()>
    {
        self.waits += 1;
        if let Some(next) = self.scripted_states.pop_front() {
            self.state = next;
        }
        Ok(())
    }

    fn call_stack(&mut self, max_depth: usize, _include_arguments: bool) -> MojostepResult<Vec<String>>
    {
        Ok(self.state.frames.iter().take(max_depth).cloned().collect())
    }

    fn current_source(&mut self) -> MojostepResult<Option<SourceInfo>>
    {
        Ok(self.state.source.clone())
    }

    fn current_process_id(&mut self) -> MojostepResult<ProcessId>
    {
        Ok(self.process)
    }

    fn current_thread_id(&mut self) -> MojostepResult<ThreadId>
    {
        Ok(self.thread)
    }

    fn set_current_process(&mut self, process: ProcessId) -> MojostepResult<()>
    {
        self.process_selects.push(process);
        if !self.refuse_focus_changes {
            self.process = process;
        }
        Ok(())
    }

    fn set_current_thread(&mut self, thread: ThreadId) -> MojostepResult<()>
    {
        self.thread_selects.push(thread);
        if !self.refuse_focus_changes {
            self.thread = thread;
        }
        Ok(())
    }

    fn evaluate(&mut self, expression: &str) -> MojostepResult<String>
    {
        self.evaluated.push(expression.to_string());
        Ok("int 0x20000008".to_string())
    }
}

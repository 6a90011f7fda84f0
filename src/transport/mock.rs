//! Simulated chip transport.
//!
//! Behaves like a TMC5160 on the wire: writes latch into a register bank,
//! reads are answered one datagram late, and every exchange is recorded so
//! tests can assert on exact bus traffic. Also useful on hosts without
//! hardware attached.

use std::time::Duration;

use scroll::Pread;

use super::Transport;
use crate::constants::{FRAME_SIZE, REGISTER_COUNT, wire};

/// One recorded 5-byte exchange.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    pub tx: [u8; FRAME_SIZE],
    pub rx: [u8; FRAME_SIZE],
}

impl Transaction {
    pub fn address(&self) -> u8 {
        self.tx[0] & wire::ADDRESS_MASK
    }

    pub fn is_write(&self) -> bool {
        self.tx[0] & wire::WRITE_FLAG != 0
    }

    pub fn write_value(&self) -> u32 {
        // tx layout is fixed, the pread cannot fail
        self.tx.pread_with::<u32>(1, scroll::BE).unwrap_or(0)
    }
}

pub struct MockTransport {
    registers: [u32; REGISTER_COUNT],
    transactions: Vec<Transaction>,
    pending_reply: Option<[u8; FRAME_SIZE]>,
    selected: bool,
    select_count: usize,
    deselect_count: usize,
    fail_next: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            registers: [0; REGISTER_COUNT],
            transactions: Vec::new(),
            pending_reply: None,
            selected: false,
            select_count: 0,
            deselect_count: 0,
            fail_next: false,
        }
    }

    /// Sets a register of the simulated chip directly, bypassing the wire.
    pub fn set_register(&mut self, address: u8, value: u32) {
        self.registers[address as usize % REGISTER_COUNT] = value;
    }

    /// Current value of a register of the simulated chip.
    pub fn register(&self, address: u8) -> u32 {
        self.registers[address as usize % REGISTER_COUNT]
    }

    /// Makes the next `transfer` call report failure.
    pub fn fail_next_transfer(&mut self) {
        self.fail_next = true;
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// All write transactions addressed to `address`, in bus order.
    pub fn writes_to(&self, address: u8) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.is_write() && t.address() == address)
            .copied()
            .collect()
    }

    /// Value of the most recent write to `address`, if any.
    pub fn last_written(&self, address: u8) -> Option<u32> {
        self.transactions
            .iter()
            .rev()
            .find(|t| t.is_write() && t.address() == address)
            .map(Transaction::write_value)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn select_count(&self) -> usize {
        self.select_count
    }

    pub fn deselect_count(&self) -> usize {
        self.deselect_count
    }
}

impl Transport for MockTransport {
    fn transfer(
        &mut self,
        tx: &[u8; FRAME_SIZE],
        rx: &mut [u8; FRAME_SIZE],
        _timeout: Duration,
    ) -> bool {
        if self.fail_next {
            self.fail_next = false;
            return false;
        }

        if let Some(reply) = self.pending_reply.take() {
            *rx = reply;
        }

        let transaction = Transaction { tx: *tx, rx: *rx };
        self.transactions.push(transaction);

        let address = transaction.address() as usize;
        if transaction.is_write() {
            self.registers[address] = transaction.write_value();
        } else {
            // Reads are pipelined: stage the reply for the next datagram.
            let value = self.registers[address];
            let mut reply = [0u8; FRAME_SIZE];
            reply[1..].copy_from_slice(&value.to_be_bytes());
            self.pending_reply = Some(reply);
        }

        true
    }

    fn select(&mut self) {
        self.selected = true;
        self.select_count += 1;
    }

    fn deselect(&mut self) {
        self.selected = false;
        self.deselect_count += 1;
    }
}

//! Minimal kernel type bindings for the mount-namespace walk.
//!
//! Generated with `aya-tool generate task_struct` against the build host's
//! BTF and trimmed to the fields the programs read. Regenerate against the
//! target kernel when field offsets move.

#![allow(non_camel_case_types)]

#[repr(C)]
pub struct ns_common {
    pub stashed: *mut core::ffi::c_void,
    pub ops: *const core::ffi::c_void,
    pub inum: u32,
}

#[repr(C)]
pub struct mnt_namespace {
    pub ns: ns_common,
}

#[repr(C)]
pub struct nsproxy {
    pub count: i32,
    pub _pad0: [u8; 4],
    pub uts_ns: *mut core::ffi::c_void,
    pub ipc_ns: *mut core::ffi::c_void,
    pub mnt_ns: *mut mnt_namespace,
}

#[repr(C)]
pub struct task_struct {
    pub _pad0: [u8; 0xbd0],
    pub nsproxy: *mut nsproxy,
}

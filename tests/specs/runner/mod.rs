// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod cancellation;
mod docker;
mod exit_status;
mod ssh_layout;

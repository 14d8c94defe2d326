mod acknowledged_write_case;
mod broadcast_case;
mod failover_case;

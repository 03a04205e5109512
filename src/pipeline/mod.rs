pub mod admission; // Image admission gate: media type, pixel heuristics, semantic check

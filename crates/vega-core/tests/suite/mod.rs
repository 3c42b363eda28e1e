mod position_mapping;

flat_mod!(flags, mem);
